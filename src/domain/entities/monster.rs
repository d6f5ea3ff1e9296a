//! Monster catalog entries
//!
//! Catalog metadata is generated offline (name, CR, combat role, theme
//! keywords, one-line summary per stat block) and loaded once per session.
//! Entries are never mutated at runtime; the filter and combo generator only
//! read them.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ChallengeRating;

/// A single creature's catalog metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterMetadata {
    /// Catalog file key, e.g. "goblin-warrior.html"
    pub file: String,
    pub name: String,
    pub cr: ChallengeRating,
    /// Creature type as written in the stat block meta line ("Beast", "Undead", ...)
    #[serde(default)]
    pub creature_type: String,
    pub combat_role: CombatRole,
    #[serde(default)]
    pub theme_keywords: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl MonsterMetadata {
    pub fn xp(&self) -> u32 {
        self.cr.xp()
    }

    /// Count of keywords from `wanted` this monster carries, matched exactly
    /// and case-insensitively.
    pub fn keyword_matches<'a>(
        &'a self,
        wanted: &'a [String],
    ) -> impl Iterator<Item = &'a String> + 'a {
        self.theme_keywords.iter().filter(|own| {
            wanted
                .iter()
                .any(|w| w.eq_ignore_ascii_case(own.as_str()))
        })
    }
}

/// Battlefield role a creature plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatRole {
    Striker,
    Tank,
    Controller,
    Support,
    Skirmisher,
    Artillery,
    Infiltrator,
}

impl CombatRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Striker => "Striker",
            Self::Tank => "Tank",
            Self::Controller => "Controller",
            Self::Support => "Support",
            Self::Skirmisher => "Skirmisher",
            Self::Artillery => "Artillery",
            Self::Infiltrator => "Infiltrator",
        }
    }

    /// Roles that keep up with a fleeing or pursuing party
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Skirmisher | Self::Striker | Self::Infiltrator)
    }
}

/// The full catalog document as loaded from the static resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterCatalog {
    pub monsters: Vec<MonsterMetadata>,
    /// All keywords known to the catalog, used to sanity-check generator
    /// keyword suggestions
    #[serde(default)]
    pub theme_keywords: Vec<String>,
}

impl MonsterCatalog {
    pub fn is_known_keyword(&self, keyword: &str) -> bool {
        self.theme_keywords.is_empty()
            || self
                .theme_keywords
                .iter()
                .any(|k| k.eq_ignore_ascii_case(keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monster(keywords: &[&str]) -> MonsterMetadata {
        MonsterMetadata {
            file: "test.html".to_string(),
            name: "Test".to_string(),
            cr: ChallengeRating::Whole(1),
            creature_type: "Humanoid".to_string(),
            combat_role: CombatRole::Striker,
            theme_keywords: keywords.iter().map(|s| s.to_string()).collect(),
            summary: String::new(),
        }
    }

    #[test]
    fn test_keyword_matching_is_case_insensitive_and_exact() {
        let m = monster(&["undead", "gothic-horror"]);
        let wanted = vec!["UNDEAD".to_string(), "gothic".to_string()];
        let matched: Vec<_> = m.keyword_matches(&wanted).collect();
        // "gothic" must not match "gothic-horror" - exact tokens only
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0], "undead");
    }

    #[test]
    fn test_catalog_keyword_lookup_defaults_open() {
        let catalog = MonsterCatalog {
            monsters: vec![],
            theme_keywords: vec![],
        };
        // A catalog without a keyword taxonomy accepts any suggestion
        assert!(catalog.is_known_keyword("anything"));

        let catalog = MonsterCatalog {
            monsters: vec![],
            theme_keywords: vec!["undead".to_string()],
        };
        assert!(catalog.is_known_keyword("Undead"));
        assert!(!catalog.is_known_keyword("pirate"));
    }
}
