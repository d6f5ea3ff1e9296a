//! Combo generator - combinatorial creature line-up search
//!
//! Explores combinations of filtered candidates and repeat counts whose
//! recomputed total XP lands inside the target window. The search is pure
//! and deterministic; an empty result is a hard failure the orchestrator
//! must surface, never a license to substitute something outside the window.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{CreatureAssignment, MonsterMetadata};
use crate::domain::value_objects::{PartyProfile, XpWindow};

/// Hordes are discouraged outright
pub const MAX_CREATURES: u32 = 4;
/// Cognitive-load ceiling for the table
pub const MAX_STAT_BLOCKS: usize = 3;
/// CR 0 creatures are capped absolutely, not per budget
pub const MAX_CR_ZERO: u32 = 3;
/// How many ranked combos are returned
pub const TOP_COMBO_LIMIT: usize = 5;

/// Creature-to-player ratio ceiling below party level 5
const LOW_LEVEL_RATIO: f64 = 2.0;
/// Softer ratio ceiling at party level 5 and above
const HIGH_LEVEL_RATIO: f64 = 3.0;

/// One pick inside a combo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboPick {
    pub monster: MonsterMetadata,
    pub count: u32,
}

/// A concrete creature line-up whose total XP sits inside the window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboOption {
    pub picks: Vec<ComboPick>,
    /// Recomputed from the CR table - the single source of truth
    pub total_xp: u32,
    pub creature_count: u32,
    pub stat_block_count: u32,
    /// Rounded percent of the budget this combo consumes
    pub percent_of_budget: u32,
    pub description: String,
    pub warnings: Vec<String>,
}

impl ComboOption {
    /// Convert to the committed-assignment form
    pub fn assignments(&self) -> Vec<CreatureAssignment> {
        self.picks
            .iter()
            .map(|p| CreatureAssignment {
                file: p.monster.file.clone(),
                name: p.monster.name.clone(),
                count: p.count,
            })
            .collect()
    }
}

/// Deterministic combo search
pub struct ComboGenerator;

impl ComboGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate the top ranked combos for a candidate pool.
    ///
    /// Returns at most [`TOP_COMBO_LIMIT`] options; an empty vec means no
    /// line-up satisfies the window under the safety constraints.
    pub fn generate(
        &self,
        candidates: &[MonsterMetadata],
        budget: u32,
        party: PartyProfile,
        window: XpWindow,
    ) -> Vec<ComboOption> {
        let max_creatures = self.creature_ceiling(party);

        // Highest XP first so the search can cut off early once even the
        // cheapest remaining candidate cannot reach the window
        let mut pool: Vec<&MonsterMetadata> = candidates.iter().collect();
        pool.sort_by(|a, b| b.cr.cmp(&a.cr).then_with(|| a.name.cmp(&b.name)));
        pool.dedup_by(|a, b| a.file == b.file);

        let mut found: Vec<Vec<(usize, u32)>> = Vec::new();
        let mut picks: Vec<(usize, u32)> = Vec::new();
        self.search(&pool, window, max_creatures, 0, 0, 0, &mut picks, &mut found);

        tracing::debug!(
            candidates = pool.len(),
            combos = found.len(),
            "combo search complete"
        );

        let mut options: Vec<ComboOption> = found
            .into_iter()
            .map(|picks| self.build_option(&pool, &picks, budget, party))
            .collect();

        options.sort_by(|a, b| {
            let dist_a = a.total_xp.abs_diff(budget);
            let dist_b = b.total_xp.abs_diff(budget);
            dist_a
                .cmp(&dist_b)
                .then_with(|| role_diversity(b).cmp(&role_diversity(a)))
                .then_with(|| a.stat_block_count.cmp(&b.stat_block_count))
                .then_with(|| a.description.cmp(&b.description))
        });
        options.truncate(TOP_COMBO_LIMIT);
        options
    }

    /// How many creatures the party can safely face
    fn creature_ceiling(&self, party: PartyProfile) -> u32 {
        let ratio = if party.level < 5 {
            LOW_LEVEL_RATIO
        } else {
            HIGH_LEVEL_RATIO
        };
        let by_ratio = (party.size as f64 * ratio).floor() as u32;
        by_ratio.clamp(1, MAX_CREATURES)
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        pool: &[&MonsterMetadata],
        window: XpWindow,
        max_creatures: u32,
        index: usize,
        total_xp: u32,
        creature_count: u32,
        picks: &mut Vec<(usize, u32)>,
        found: &mut Vec<Vec<(usize, u32)>>,
    ) {
        if index >= pool.len()
            || picks.len() >= MAX_STAT_BLOCKS
            || creature_count >= max_creatures
            || total_xp >= window.max
        {
            return;
        }

        let monster = pool[index];
        let per_creature = monster.xp();
        let count_ceiling = if monster.cr.rank() == 0 {
            MAX_CR_ZERO.min(max_creatures - creature_count)
        } else {
            max_creatures - creature_count
        };

        // Take `count` copies of this stat block, then move on
        for count in 1..=count_ceiling {
            let added = per_creature.saturating_mul(count);
            let new_total = total_xp.saturating_add(added);
            if new_total > window.max {
                break;
            }
            picks.push((index, count));
            if window.contains(new_total) {
                found.push(picks.clone());
            }
            self.search(
                pool,
                window,
                max_creatures,
                index + 1,
                new_total,
                creature_count + count,
                picks,
                found,
            );
            picks.pop();
        }

        // Skip this stat block entirely
        self.search(
            pool,
            window,
            max_creatures,
            index + 1,
            total_xp,
            creature_count,
            picks,
            found,
        );
    }

    fn build_option(
        &self,
        pool: &[&MonsterMetadata],
        picks: &[(usize, u32)],
        budget: u32,
        party: PartyProfile,
    ) -> ComboOption {
        let picks: Vec<ComboPick> = picks
            .iter()
            .map(|&(index, count)| ComboPick {
                monster: pool[index].clone(),
                count,
            })
            .collect();

        let total_xp: u32 = picks.iter().map(|p| p.monster.xp() * p.count).sum();
        let creature_count: u32 = picks.iter().map(|p| p.count).sum();
        let stat_block_count = picks.len() as u32;
        let percent_of_budget = if budget == 0 {
            0
        } else {
            ((total_xp as u64 * 100 + budget as u64 / 2) / budget as u64) as u32
        };

        let mut warnings = Vec::new();
        for pick in &picks {
            if pick.monster.cr.effective_level() > party.level {
                warnings.push(format!(
                    "{} is CR {} against a level {} party - it may one-shot a character",
                    pick.monster.name, pick.monster.cr, party.level
                ));
            }
        }

        let names = picks
            .iter()
            .map(|p| format!("{}x {}", p.count, p.monster.name))
            .collect::<Vec<_>>()
            .join(" + ");
        let description = format!("{names} ({total_xp} XP, {percent_of_budget}% of budget)");

        ComboOption {
            picks,
            total_xp,
            creature_count,
            stat_block_count,
            percent_of_budget,
            description,
            warnings,
        }
    }
}

impl Default for ComboGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of distinct combat roles in a combo (tiebreak: varied line-ups
/// read better at the table)
fn role_diversity(option: &ComboOption) -> usize {
    let mut roles: Vec<_> = option.picks.iter().map(|p| p.monster.combat_role).collect();
    roles.sort_by_key(|r| *r as u8);
    roles.dedup();
    roles.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CombatRole;
    use crate::domain::value_objects::ChallengeRating;

    fn monster(name: &str, cr: ChallengeRating, role: CombatRole) -> MonsterMetadata {
        MonsterMetadata {
            file: format!("{}.html", name.to_lowercase().replace(' ', "-")),
            name: name.to_string(),
            cr,
            creature_type: "Monstrosity".to_string(),
            combat_role: role,
            theme_keywords: vec![],
            summary: String::new(),
        }
    }

    fn party() -> PartyProfile {
        PartyProfile::new(5, 4)
    }

    #[test]
    fn test_all_results_inside_window() {
        let candidates = vec![
            monster("Owlbear", ChallengeRating::Whole(3), CombatRole::Striker),
            monster("Ettin", ChallengeRating::Whole(4), CombatRole::Tank),
            monster("Hill Giant", ChallengeRating::Whole(5), CombatRole::Tank),
        ];
        let budget = 3_000;
        let window = XpWindow::around(budget);

        let combos = ComboGenerator::new().generate(&candidates, budget, party(), window);
        assert!(!combos.is_empty(), "CR 3/4/5 pool must yield a combo for a 3000 XP budget");
        for combo in &combos {
            assert!(
                window.contains(combo.total_xp),
                "{} falls outside [{}, {}]",
                combo.description,
                window.min,
                window.max
            );
        }
    }

    #[test]
    fn test_respects_creature_and_stat_block_caps() {
        let candidates = vec![
            monster("Ghoul", ChallengeRating::Whole(1), CombatRole::Striker),
            monster("Ghast", ChallengeRating::Whole(2), CombatRole::Striker),
            monster("Wight", ChallengeRating::Whole(3), CombatRole::Striker),
            monster("Mummy", ChallengeRating::Whole(3), CombatRole::Tank),
        ];
        let budget = 3_000;
        let combos = ComboGenerator::new().generate(&candidates, budget, party(), XpWindow::around(budget));

        for combo in &combos {
            assert!(combo.creature_count <= MAX_CREATURES);
            assert!(combo.stat_block_count as usize <= MAX_STAT_BLOCKS);
        }
    }

    #[test]
    fn test_ratio_guard_tightens_for_small_low_level_parties() {
        let generator = ComboGenerator::new();
        // Solo level 1 character: at most 2 creatures
        assert_eq!(generator.creature_ceiling(PartyProfile::new(1, 1)), 2);
        // Full level 10 party: capped by the absolute horde limit
        assert_eq!(generator.creature_ceiling(PartyProfile::new(10, 4)), MAX_CREATURES);
    }

    #[test]
    fn test_empty_result_when_window_unreachable() {
        // A single CR 10 creature (5900 XP) cannot hit a 600 XP window
        let candidates = vec![monster("Stone Golem", ChallengeRating::Whole(10), CombatRole::Tank)];
        let budget = 600;
        let combos = ComboGenerator::new().generate(
            &candidates,
            budget,
            PartyProfile::new(3, 4),
            XpWindow::around(budget),
        );
        assert!(combos.is_empty());
    }

    #[test]
    fn test_cr_zero_capped_absolutely() {
        let candidates = vec![
            monster("Commoner", ChallengeRating::Zero, CombatRole::Support),
            monster("Bandit Captain", ChallengeRating::Whole(2), CombatRole::Striker),
        ];
        let budget = 480; // 2x bandit captain region
        let combos = ComboGenerator::new().generate(
            &candidates,
            budget,
            PartyProfile::new(3, 4),
            XpWindow::around(budget),
        );
        for combo in &combos {
            let zeros: u32 = combo
                .picks
                .iter()
                .filter(|p| p.monster.cr == ChallengeRating::Zero)
                .map(|p| p.count)
                .sum();
            assert!(zeros <= MAX_CR_ZERO);
        }
    }

    #[test]
    fn test_overleveled_creature_carries_warning() {
        let candidates = vec![monster("Young Dragon", ChallengeRating::Whole(7), CombatRole::Striker)];
        let budget = 2_900;
        let combos = ComboGenerator::new().generate(
            &candidates,
            budget,
            PartyProfile::new(5, 4),
            XpWindow::around(budget),
        );
        assert!(!combos.is_empty());
        assert!(combos[0]
            .warnings
            .iter()
            .any(|w| w.contains("one-shot")));
    }

    #[test]
    fn test_ranking_prefers_closeness_to_budget() {
        let candidates = vec![
            monster("Ettin", ChallengeRating::Whole(4), CombatRole::Tank),
            monster("Owlbear", ChallengeRating::Whole(3), CombatRole::Striker),
            monster("Veteran", ChallengeRating::Whole(3), CombatRole::Striker),
        ];
        let budget = 2_900;
        let combos = ComboGenerator::new().generate(&candidates, budget, party(), XpWindow::around(budget));
        assert!(!combos.is_empty());
        for pair in combos.windows(2) {
            assert!(
                pair[0].total_xp.abs_diff(budget) <= pair[1].total_xp.abs_diff(budget),
                "ranking must be by distance from budget first"
            );
        }
    }

    #[test]
    fn test_returns_at_most_five() {
        let candidates: Vec<_> = (1..=6)
            .map(|i| monster(&format!("Brute {i}"), ChallengeRating::Whole(3), CombatRole::Striker))
            .collect();
        let budget = 2_800; // 4x CR3 = 2800
        let combos = ComboGenerator::new().generate(&candidates, budget, party(), XpWindow::around(budget));
        assert!(combos.len() <= TOP_COMBO_LIMIT);
    }

    #[test]
    fn test_deterministic() {
        let candidates = vec![
            monster("Owlbear", ChallengeRating::Whole(3), CombatRole::Striker),
            monster("Ettin", ChallengeRating::Whole(4), CombatRole::Tank),
            monster("Hill Giant", ChallengeRating::Whole(5), CombatRole::Tank),
        ];
        let budget = 3_000;
        let generator = ComboGenerator::new();
        let a = generator.generate(&candidates, budget, party(), XpWindow::around(budget));
        let b = generator.generate(&candidates, budget, party(), XpWindow::around(budget));
        let describe = |c: &[ComboOption]| c.iter().map(|o| o.description.clone()).collect::<Vec<_>>();
        assert_eq!(describe(&a), describe(&b));
    }
}
