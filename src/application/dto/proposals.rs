//! Wire schemas for generator proposals
//!
//! The generator is instructed to answer with a single JSON object matching
//! exactly one of these schemas. Decoding is a tagged union with required
//! fields and fails closed: a response missing a required field, or shaped
//! like none of the variants, is a parse failure - it is never accepted as a
//! partially-filled proposal.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{
    Connection, EncounterNode, EncounterType, NodeEdit, StructureDelta,
};
use crate::domain::value_objects::{ChallengeRating, DifficultyTier, EncounterId};

/// Any proposal the generator may answer with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorProposalDto {
    Structure(StructureProposalDto),
    Monsters(MonsterProposalDto),
    Keywords(KeywordSuggestionDto),
}

/// Schema for structure proposals: cards to add, edits, connections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureProposalDto {
    #[serde(default)]
    pub cards_to_add: Vec<CardDto>,
    #[serde(default)]
    pub edits: Vec<CardEditDto>,
    #[serde(default)]
    pub connections: Vec<ConnectionDto>,
    pub explanation: String,
}

/// One proposed encounter card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDto {
    /// Generator-local key ("card-1") or the UUID of an existing node
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub encounter_type: EncounterType,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub difficulty: Option<DifficultyTier>,
    #[serde(default)]
    pub is_ending: bool,
}

/// A proposed edit to an existing card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardEditDto {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<DifficultyTier>,
    #[serde(default)]
    pub is_ending: Option<bool>,
}

/// A proposed connection; sides default to the only legal flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub from: String,
    pub to: String,
}

/// Schema for monster proposals: a creature line-up for one encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterProposalDto {
    pub encounter_id: Uuid,
    pub monsters: Vec<MonsterPickDto>,
    /// The generator's self-reported arithmetic; kept only for the mismatch
    /// diagnostic, never used as the committed total
    #[serde(rename = "totalXP")]
    pub total_xp: u32,
    pub explanation: String,
}

/// One creature pick within a monster proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterPickDto {
    /// Catalog file key
    pub filename: String,
    pub name: String,
    pub cr: ChallengeRating,
    pub count: u32,
    #[serde(default)]
    pub reasoning: String,
}

/// Schema for keyword suggestions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSuggestionDto {
    pub keywords: Vec<String>,
    pub reasoning: String,
}

/// Why a generator response could not be decoded or resolved
#[derive(Debug, thiserror::Error)]
pub enum ProposalDecodeError {
    #[error("response is not a recognized proposal object: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("response contains no JSON object")]
    NoJson,
    #[error("connection endpoint {0:?} does not resolve to a card")]
    UnresolvedEndpoint(String),
    #[error("edit target {0:?} is not a known node id")]
    UnresolvedEditTarget(String),
    #[error("proposed connection is invalid: {0}")]
    BadConnection(#[from] crate::domain::entities::ConnectionError),
}

/// Decode a raw generator response into a proposal DTO.
///
/// Tolerates markdown code fences and leading/trailing prose around the JSON
/// object, but nothing looser: the object itself must match a schema.
pub fn decode_proposal(raw: &str) -> Result<GeneratorProposalDto, ProposalDecodeError> {
    let json = extract_json_object(raw).ok_or(ProposalDecodeError::NoJson)?;
    Ok(serde_json::from_str(json)?)
}

/// Locate the outermost JSON object in a response, stripping code fences
fn extract_json_object(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let body = if let Some(rest) = trimmed.split_once("```json").map(|(_, r)| r) {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some(rest) = trimmed.split_once("```").map(|(_, r)| r) {
        rest.split("```").next().unwrap_or(rest)
    } else {
        trimmed
    };
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(&body[start..=end])
}

impl StructureProposalDto {
    /// Resolve local card keys and existing-node UUIDs into a domain delta.
    ///
    /// `existing` is the set of node ids already committed; connection
    /// endpoints and edit targets may reference either those or cards added
    /// by this same proposal.
    pub fn into_delta(
        self,
        existing: &[EncounterId],
    ) -> Result<StructureDelta, ProposalDecodeError> {
        let mut additions = Vec::with_capacity(self.cards_to_add.len());
        let mut local_ids: Vec<(String, EncounterId)> = Vec::new();

        for card in self.cards_to_add {
            let mut node = EncounterNode::new(card.title, card.encounter_type)
                .with_description(card.description)
                .with_position(card.x, card.y);
            if let Some(tier) = card.difficulty {
                node = node.with_difficulty(tier);
            }
            node.is_ending = card.is_ending;
            local_ids.push((card.id, node.id));
            additions.push(node);
        }

        let resolve = |key: &str| -> Option<EncounterId> {
            if let Some((_, id)) = local_ids.iter().find(|(local, _)| local == key) {
                return Some(*id);
            }
            let uuid: Uuid = key.parse().ok()?;
            let id = EncounterId::from_uuid(uuid);
            existing.contains(&id).then_some(id)
        };

        let mut edits = Vec::with_capacity(self.edits.len());
        for edit in self.edits {
            let id = resolve(&edit.id)
                .ok_or_else(|| ProposalDecodeError::UnresolvedEditTarget(edit.id.clone()))?;
            edits.push(NodeEdit {
                id,
                title: edit.title,
                description: edit.description,
                difficulty: edit.difficulty,
                is_ending: edit.is_ending,
            });
        }

        let mut connections = Vec::with_capacity(self.connections.len());
        for dto in self.connections {
            let from = resolve(&dto.from)
                .ok_or_else(|| ProposalDecodeError::UnresolvedEndpoint(dto.from.clone()))?;
            let to = resolve(&dto.to)
                .ok_or_else(|| ProposalDecodeError::UnresolvedEndpoint(dto.to.clone()))?;
            connections.push(Connection::flow(from, to)?);
        }

        Ok(StructureDelta {
            additions,
            edits,
            connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_monster_proposal() {
        let raw = r#"{
            "type": "monsters",
            "encounter_id": "6f02e882-5b8f-49a3-9f6e-0dc9a26b6c3a",
            "monsters": [
                {"filename": "ghoul.html", "name": "Ghoul", "cr": "1", "count": 3, "reasoning": "pack hunters"}
            ],
            "totalXP": 600,
            "explanation": "A ghoul pack"
        }"#;

        match decode_proposal(raw).unwrap() {
            GeneratorProposalDto::Monsters(p) => {
                assert_eq!(p.monsters.len(), 1);
                assert_eq!(p.monsters[0].count, 3);
                assert_eq!(p.total_xp, 600);
            }
            other => panic!("expected monsters proposal, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_strips_code_fences() {
        let raw = "Here you go:\n```json\n{\"type\": \"keywords\", \"keywords\": [\"undead\"], \"reasoning\": \"crypt theme\"}\n```";
        assert!(matches!(
            decode_proposal(raw).unwrap(),
            GeneratorProposalDto::Keywords(_)
        ));
    }

    #[test]
    fn test_decode_fails_closed_on_missing_fields() {
        // keywords schema without its required "reasoning" field
        let raw = r#"{"type": "keywords", "keywords": ["undead"]}"#;
        assert!(decode_proposal(raw).is_err());

        // monsters schema without totalXP
        let raw = r#"{"type": "monsters", "encounter_id": "6f02e882-5b8f-49a3-9f6e-0dc9a26b6c3a", "monsters": [], "explanation": "x"}"#;
        assert!(decode_proposal(raw).is_err());
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode_proposal("I am sorry, I cannot help with that."),
            Err(ProposalDecodeError::NoJson)
        ));
    }

    #[test]
    fn test_structure_delta_resolution() {
        let raw = r#"{
            "type": "structure",
            "cards_to_add": [
                {"id": "card-1", "title": "Crypt Entrance", "encounter_type": "combat", "difficulty": "moderate"},
                {"id": "card-2", "title": "Inner Sanctum", "encounter_type": "puzzle", "is_ending": true}
            ],
            "connections": [{"from": "card-1", "to": "card-2"}],
            "explanation": "Two-room crypt"
        }"#;

        let dto = match decode_proposal(raw).unwrap() {
            GeneratorProposalDto::Structure(dto) => dto,
            other => panic!("expected structure proposal, got {:?}", other),
        };

        let delta = dto.into_delta(&[]).unwrap();
        assert_eq!(delta.additions.len(), 2);
        assert_eq!(delta.connections.len(), 1);
        assert_eq!(delta.connections[0].from, delta.additions[0].id);
        assert_eq!(delta.connections[0].to, delta.additions[1].id);
    }

    #[test]
    fn test_structure_delta_rejects_dangling_connection() {
        let dto = StructureProposalDto {
            cards_to_add: vec![],
            edits: vec![],
            connections: vec![ConnectionDto {
                from: "card-1".to_string(),
                to: "card-2".to_string(),
            }],
            explanation: String::new(),
        };
        assert!(matches!(
            dto.into_delta(&[]),
            Err(ProposalDecodeError::UnresolvedEndpoint(_))
        ));
    }
}
