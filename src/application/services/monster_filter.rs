//! Monster catalog filter
//!
//! Narrows the full catalog to candidates worth handing to the combo
//! generator. Filtering is deterministic for a given catalog and keyword
//! set; the only non-deterministic input is the keyword suggestion from the
//! external generator, which the orchestrator has the user confirm first.

use std::collections::BTreeMap;

use crate::domain::entities::{EncounterType, MonsterCatalog, MonsterMetadata};
use crate::domain::value_objects::PartyProfile;

/// Hard ceiling on candidates handed downstream
pub const CANDIDATE_CEILING: usize = 80;
/// Below this many keyword survivors, fall back to the unfiltered top
pub const MIN_KEYWORD_SURVIVORS: usize = 10;
/// Per-CR cap applied by the diversity fallback
pub const PER_CR_CAP: usize = 8;
/// The catch-all keyword, weighted below specific ones so it cannot
/// dominate matching
pub const GENERIC_KEYWORD: &str = "urban";

const GENERIC_WEIGHT: u32 = 1;
const SPECIFIC_WEIGHT: u32 = 2;

/// Result of a filter pass
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub candidates: Vec<MonsterMetadata>,
    /// True when the primary pool exceeded the ceiling and no keywords were
    /// supplied; the orchestrator should obtain theme keywords and re-run
    pub needs_keywords: bool,
}

/// Deterministic catalog filter
pub struct MonsterFilter;

impl MonsterFilter {
    pub fn new() -> Self {
        Self
    }

    /// Narrow the catalog for one encounter.
    ///
    /// `keywords` is the user-confirmed theme keyword set, if any. Output
    /// never exceeds [`CANDIDATE_CEILING`].
    pub fn filter(
        &self,
        catalog: &MonsterCatalog,
        budget: u32,
        party: PartyProfile,
        encounter_type: EncounterType,
        keywords: Option<&[String]>,
    ) -> FilterOutcome {
        let mut pool = self.primary_filter(catalog, budget, party, encounter_type);
        tracing::debug!(
            pool = pool.len(),
            budget,
            "primary filter pass complete"
        );

        if pool.len() > CANDIDATE_CEILING && keywords.is_none() {
            // The ceiling holds even on this path; callers may surface the
            // pool while keywords are being obtained
            return FilterOutcome {
                candidates: self.diversity_cap(pool),
                needs_keywords: true,
            };
        }

        if let Some(keywords) = keywords {
            pool = self.keyword_narrow(pool, keywords);
        }

        if pool.len() > CANDIDATE_CEILING {
            pool = self.diversity_cap(pool);
        }

        FilterOutcome {
            candidates: pool,
            needs_keywords: false,
        }
    }

    /// CR band and role suitability
    fn primary_filter(
        &self,
        catalog: &MonsterCatalog,
        budget: u32,
        party: PartyProfile,
        encounter_type: EncounterType,
    ) -> Vec<MonsterMetadata> {
        // A candidate must be able to contribute meaningfully without
        // single-handedly blowing the budget, and must not outclass the
        // party outright.
        let min_xp = budget / 25;
        let max_cr_level = party.level.saturating_add(3);

        let mut pool: Vec<MonsterMetadata> = catalog
            .monsters
            .iter()
            .filter(|m| {
                let xp = m.xp();
                xp >= min_xp
                    && xp <= budget
                    && m.cr.effective_level() <= max_cr_level
                    && role_suits(m, encounter_type)
            })
            .cloned()
            .collect();

        // Stable order independent of catalog file ordering
        pool.sort_by(|a, b| b.cr.cmp(&a.cr).then_with(|| a.name.cmp(&b.name)));
        pool
    }

    /// Score by keyword matches and keep matching candidates
    fn keyword_narrow(
        &self,
        pool: Vec<MonsterMetadata>,
        keywords: &[String],
    ) -> Vec<MonsterMetadata> {
        let mut scored: Vec<(u32, MonsterMetadata)> = pool
            .iter()
            .map(|m| (keyword_score(m, keywords), m.clone()))
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));

        if scored.len() < MIN_KEYWORD_SURVIVORS {
            // Too aggressive - better an unthemed pool than an empty one
            tracing::debug!(
                survivors = scored.len(),
                "keyword narrowing left too few candidates, falling back"
            );
            return pool.into_iter().take(CANDIDATE_CEILING).collect();
        }

        scored.into_iter().map(|(_, m)| m).collect()
    }

    /// Group by CR and cap each group, shrinking the cap until the pool fits
    /// the ceiling. Keeps every CR tier represented so the combo generator
    /// downstream still has multiple tiers to sum with.
    fn diversity_cap(&self, pool: Vec<MonsterMetadata>) -> Vec<MonsterMetadata> {
        let mut groups: BTreeMap<u8, Vec<MonsterMetadata>> = BTreeMap::new();
        for monster in pool {
            groups.entry(monster.cr.rank()).or_default().push(monster);
        }

        let mut cap = PER_CR_CAP;
        loop {
            let total: usize = groups.values().map(|g| g.len().min(cap)).sum();
            if total <= CANDIDATE_CEILING || cap == 1 {
                break;
            }
            cap -= 1;
        }

        let mut result: Vec<MonsterMetadata> = groups
            .into_values()
            .flat_map(|group| group.into_iter().take(cap))
            .collect();
        result.truncate(CANDIDATE_CEILING);
        result
    }
}

impl Default for MonsterFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a creature's role fits the encounter kind
fn role_suits(monster: &MonsterMetadata, encounter_type: EncounterType) -> bool {
    match encounter_type {
        EncounterType::Chase => monster.combat_role.is_mobile(),
        // Combat takes every role; non-combat-like types never reach the
        // filter but are permissive if they do
        _ => true,
    }
}

/// Weighted keyword match count; the generic keyword scores lower than
/// specific ones
fn keyword_score(monster: &MonsterMetadata, keywords: &[String]) -> u32 {
    monster
        .keyword_matches(keywords)
        .map(|k| {
            if k.eq_ignore_ascii_case(GENERIC_KEYWORD) {
                GENERIC_WEIGHT
            } else {
                SPECIFIC_WEIGHT
            }
        })
        .sum()
}
