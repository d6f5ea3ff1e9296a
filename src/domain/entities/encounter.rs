//! Encounter nodes - the scenes that make up an adventure's structure

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{DifficultyTier, EncounterId, NpcId, RewardId};

/// One scene/challenge in the adventure graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterNode {
    pub id: EncounterId,
    pub title: String,
    pub description: String,
    pub encounter_type: EncounterType,
    pub position: Position,
    /// Only meaningful for combat and chase encounters
    pub difficulty: Option<DifficultyTier>,
    /// Catalog file keys of creatures committed to this encounter
    pub creatures: Vec<CreatureAssignment>,
    pub npcs: Vec<NpcId>,
    pub rewards: Vec<RewardId>,
    /// Intentional terminal: a node with no outgoing connections is only
    /// valid when this is set
    pub is_ending: bool,
}

impl EncounterNode {
    pub fn new(title: impl Into<String>, encounter_type: EncounterType) -> Self {
        Self {
            id: EncounterId::new(),
            title: title.into(),
            description: String::new(),
            encounter_type,
            position: Position::default(),
            difficulty: None,
            creatures: Vec::new(),
            npcs: Vec::new(),
            rewards: Vec::new(),
            is_ending: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    pub fn with_difficulty(mut self, tier: DifficultyTier) -> Self {
        self.difficulty = Some(tier);
        self
    }

    pub fn as_ending(mut self) -> Self {
        self.is_ending = true;
        self
    }

    /// Whether this node type takes a creature line-up at all
    pub fn supports_creatures(&self) -> bool {
        self.encounter_type.is_combat_like()
    }
}

/// Closed set of encounter kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncounterType {
    Combat,
    Social,
    Investigation,
    Puzzle,
    Hazard,
    Chase,
    Survival,
    SkillChallenge,
}

impl EncounterType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Combat => "Combat",
            Self::Social => "Social",
            Self::Investigation => "Investigation",
            Self::Puzzle => "Puzzle",
            Self::Hazard => "Hazard",
            Self::Chase => "Chase",
            Self::Survival => "Survival",
            Self::SkillChallenge => "Skill Challenge",
        }
    }

    /// Combat and chase encounters carry difficulty tiers and creature
    /// line-ups; the other kinds do not.
    pub fn is_combat_like(&self) -> bool {
        matches!(self, Self::Combat | Self::Chase)
    }
}

/// 2-D canvas position of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A creature committed to an encounter, by catalog key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureAssignment {
    /// Catalog file key
    pub file: String,
    pub name: String,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let node = EncounterNode::new("Ambush at the Bridge", EncounterType::Combat)
            .with_description("Bandits spring from the reeds")
            .with_position(120.0, 40.0)
            .with_difficulty(DifficultyTier::High);

        assert_eq!(node.title, "Ambush at the Bridge");
        assert_eq!(node.difficulty, Some(DifficultyTier::High));
        assert!(!node.is_ending);
        assert!(node.supports_creatures());
    }

    #[test]
    fn test_only_combat_like_types_take_creatures() {
        assert!(EncounterType::Combat.is_combat_like());
        assert!(EncounterType::Chase.is_combat_like());
        assert!(!EncounterType::Social.is_combat_like());
        assert!(!EncounterType::SkillChallenge.is_combat_like());
    }
}
