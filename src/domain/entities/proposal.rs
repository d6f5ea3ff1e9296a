//! Proposals - generator-produced change sets awaiting user decision
//!
//! Every proposal kind is a distinct variant with its own required data; the
//! engine never handles a loosely-shaped "whatever the model returned"
//! object. Once resolved, a proposal is an immutable history entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Connection, CreatureAssignment, EncounterNode};
use crate::domain::value_objects::{DifficultyTier, EncounterId, ProposalId};

/// Lifecycle of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A not-yet-committed change set produced by the external generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub kind: ProposalKind,
    pub status: ProposalStatus,
    /// Validation warnings carried to the user when the proposal is shown
    /// despite a failed (and already retried) validation
    pub warnings: Vec<String>,
    /// How many corrective retries were spent producing this proposal
    pub retries_used: u32,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Proposal {
    pub fn pending(kind: ProposalKind) -> Self {
        Self {
            id: ProposalId::new(),
            kind,
            status: ProposalStatus::Pending,
            warnings: Vec::new(),
            retries_used: 0,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == ProposalStatus::Pending
    }

    pub fn resolve(&mut self, status: ProposalStatus) {
        self.status = status;
        self.resolved_at = Some(Utc::now());
    }
}

/// The change set itself, one variant per proposal schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalKind {
    /// Nodes/edits/connections to merge into the adventure graph
    Structure {
        delta: StructureDelta,
        explanation: String,
    },
    /// A creature line-up for one combat/chase encounter
    Monsters {
        encounter_id: EncounterId,
        creatures: Vec<CreatureAssignment>,
        /// Authoritative total, recomputed from the CR table - never the
        /// generator's own arithmetic
        total_xp: u32,
        explanation: String,
    },
    /// Theme keywords suggested to narrow a large candidate pool
    Keywords {
        keywords: Vec<String>,
        reasoning: String,
    },
}

impl ProposalKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Structure { .. } => "structure",
            Self::Monsters { .. } => "monsters",
            Self::Keywords { .. } => "keywords",
        }
    }
}

/// Additions, edits, and connections proposed for the adventure graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureDelta {
    pub additions: Vec<EncounterNode>,
    pub edits: Vec<NodeEdit>,
    pub connections: Vec<Connection>,
}

impl StructureDelta {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.edits.is_empty() && self.connections.is_empty()
    }
}

/// A partial update to an existing node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEdit {
    pub id: EncounterId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<DifficultyTier>,
    #[serde(default)]
    pub is_ending: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut proposal = Proposal::pending(ProposalKind::Keywords {
            keywords: vec!["undead".to_string()],
            reasoning: "Crypt-themed request".to_string(),
        });

        assert!(proposal.is_pending());
        assert!(proposal.resolved_at.is_none());

        proposal.resolve(ProposalStatus::Accepted);
        assert_eq!(proposal.status, ProposalStatus::Accepted);
        assert!(proposal.resolved_at.is_some());
    }

    #[test]
    fn test_kind_names() {
        let kind = ProposalKind::Structure {
            delta: StructureDelta::default(),
            explanation: String::new(),
        };
        assert_eq!(kind.kind_name(), "structure");
    }
}
