//! Adventure aggregate - the committed structure graph
//!
//! The aggregate owns all nodes and connections and is the only thing a
//! proposal acceptance mutates. Application is all-or-nothing: a delta is
//! checked in full before any node is touched, so a half-applied proposal is
//! never observable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Connection, CreatureAssignment, EncounterNode, StructureDelta};
use crate::domain::value_objects::{AdventureId, EncounterId};

/// The committed adventure structure for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adventure {
    pub id: AdventureId,
    pub title: String,
    nodes: HashMap<EncounterId, EncounterNode>,
    connections: Vec<Connection>,
}

impl Adventure {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: AdventureId::new(),
            title: title.into(),
            nodes: HashMap::new(),
            connections: Vec::new(),
        }
    }

    pub fn node(&self, id: EncounterId) -> Option<&EncounterNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &EncounterNode> {
        self.nodes.values()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a node directly (manual UI edit path)
    pub fn add_node(&mut self, node: EncounterNode) {
        self.nodes.insert(node.id, node);
    }

    /// Remove a node and every connection touching it (explicit user action)
    pub fn remove_node(&mut self, id: EncounterId) -> Option<EncounterNode> {
        let removed = self.nodes.remove(&id);
        if removed.is_some() {
            self.connections.retain(|c| c.from != id && c.to != id);
        }
        removed
    }

    /// Add a pre-validated connection between two existing nodes
    pub fn add_connection(&mut self, connection: Connection) -> Result<(), AdventureError> {
        if !self.nodes.contains_key(&connection.from) {
            return Err(AdventureError::UnknownNode(connection.from));
        }
        if !self.nodes.contains_key(&connection.to) {
            return Err(AdventureError::UnknownNode(connection.to));
        }
        self.connections.push(connection);
        Ok(())
    }

    /// Apply an accepted structure delta atomically.
    ///
    /// Every edit and connection endpoint is resolved against the candidate
    /// state (existing nodes plus the delta's own additions) before anything
    /// is written; the first unresolvable reference rejects the whole delta.
    pub fn apply_delta(&mut self, delta: StructureDelta) -> Result<(), AdventureError> {
        // Phase 1: check everything against candidate state
        for edit in &delta.edits {
            let exists = self.nodes.contains_key(&edit.id)
                || delta.additions.iter().any(|n| n.id == edit.id);
            if !exists {
                return Err(AdventureError::UnknownNode(edit.id));
            }
        }
        for connection in &delta.connections {
            for endpoint in [connection.from, connection.to] {
                let exists = self.nodes.contains_key(&endpoint)
                    || delta.additions.iter().any(|n| n.id == endpoint);
                if !exists {
                    return Err(AdventureError::UnknownNode(endpoint));
                }
            }
        }

        // Phase 2: apply, nothing can fail past this point
        for node in delta.additions {
            self.nodes.insert(node.id, node);
        }
        for edit in delta.edits {
            // Target existence was established in phase 1
            let Some(node) = self.nodes.get_mut(&edit.id) else {
                continue;
            };
            if let Some(title) = edit.title {
                node.title = title;
            }
            if let Some(description) = edit.description {
                node.description = description;
            }
            if let Some(difficulty) = edit.difficulty {
                node.difficulty = Some(difficulty);
            }
            if let Some(is_ending) = edit.is_ending {
                node.is_ending = is_ending;
            }
        }
        self.connections.extend(delta.connections);
        Ok(())
    }

    /// Commit an accepted creature line-up to a combat/chase encounter
    pub fn assign_creatures(
        &mut self,
        encounter_id: EncounterId,
        creatures: Vec<CreatureAssignment>,
    ) -> Result<(), AdventureError> {
        let node = self
            .nodes
            .get_mut(&encounter_id)
            .ok_or(AdventureError::UnknownNode(encounter_id))?;
        if !node.supports_creatures() {
            return Err(AdventureError::NotCombatLike(encounter_id));
        }
        node.creatures = creatures;
        Ok(())
    }
}

/// Errors raised by aggregate mutation
#[derive(Debug, thiserror::Error)]
pub enum AdventureError {
    #[error("no such encounter node: {0}")]
    UnknownNode(EncounterId),
    #[error("encounter {0} does not take a creature line-up")]
    NotCombatLike(EncounterId),
}
