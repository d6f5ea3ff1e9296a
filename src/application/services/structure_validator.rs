//! Structure graph validator
//!
//! Checks a candidate adventure graph (existing structure plus a proposed
//! delta already merged) against the flow invariants, and always returns the
//! aggregate metrics so callers can both gate proposals and build
//! corrective-feedback prompts from the same result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Connection, EncounterNode, Side};
use crate::domain::value_objects::EncounterId;

/// Isolated nodes tolerated before the graph is invalid. Zero: a scene
/// nobody can reach or leave is always a mistake worth a corrective retry.
pub const MAX_ISOLATED_NODES: usize = 0;
/// Branch points required for a branching structure with more than two
/// nodes. Linear and flexible structures relax this to zero.
pub const MIN_BRANCH_POINTS: usize = 1;

/// Caller-supplied structural intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureHint {
    /// A single path start to finish
    Linear,
    /// At least one meaningful choice point expected
    Branching,
    /// No expectations about branching
    Flexible,
}

impl Default for StructureHint {
    fn default() -> Self {
        Self::Flexible
    }
}

/// Aggregate graph metrics, computed on every validation regardless of
/// pass/fail
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub average_out_degree: f64,
    /// Nodes with out-degree >= 2
    pub branch_points: usize,
    /// Nodes with no edges at all, in either direction
    pub isolated_nodes: usize,
}

/// Outcome of a validation pass. Produced fresh on every call; validating
/// the same graph twice yields identical results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub metrics: StructureMetrics,
}

/// Pure graph validator
pub struct StructureValidator;

impl StructureValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a candidate graph against the flow invariants
    pub fn validate(
        &self,
        nodes: &[EncounterNode],
        connections: &[Connection],
        hint: StructureHint,
    ) -> ValidationResult {
        let mut errors = Vec::new();

        let known: HashMap<EncounterId, &EncounterNode> =
            nodes.iter().map(|n| (n.id, n)).collect();

        let mut out_degree: HashMap<EncounterId, usize> = HashMap::new();
        let mut in_degree: HashMap<EncounterId, usize> = HashMap::new();

        for connection in connections {
            // Construction enforces the flow rule, but candidate graphs can
            // arrive deserialized from outside; re-check rather than assume.
            if connection.from_side != Side::Right || connection.to_side != Side::Left {
                errors.push(format!(
                    "connection {} violates the right-to-left flow rule ({:?} -> {:?})",
                    connection.id, connection.from_side, connection.to_side
                ));
            }
            for (endpoint, label) in [(connection.from, "origin"), (connection.to, "target")] {
                if !known.contains_key(&endpoint) {
                    errors.push(format!(
                        "connection {} {} references unknown node {}",
                        connection.id, label, endpoint
                    ));
                }
            }
            *out_degree.entry(connection.from).or_default() += 1;
            *in_degree.entry(connection.to).or_default() += 1;
        }

        let mut isolated = Vec::new();
        let mut dead_ends = Vec::new();
        for node in nodes {
            let outgoing = out_degree.get(&node.id).copied().unwrap_or(0);
            let incoming = in_degree.get(&node.id).copied().unwrap_or(0);
            if outgoing == 0 && incoming == 0 {
                isolated.push(node);
            } else if outgoing == 0 && !node.is_ending {
                dead_ends.push(node);
            }
        }

        for node in &dead_ends {
            errors.push(format!(
                "\"{}\" has no outgoing connection and is not marked as an ending",
                node.title
            ));
        }
        if isolated.len() > MAX_ISOLATED_NODES {
            for node in &isolated {
                if !node.is_ending {
                    errors.push(format!(
                        "\"{}\" is isolated: no connections in or out",
                        node.title
                    ));
                }
            }
        }

        let branch_points = out_degree.values().filter(|&&d| d >= 2).count();
        if hint == StructureHint::Branching
            && nodes.len() > 2
            && branch_points < MIN_BRANCH_POINTS
        {
            errors.push(format!(
                "a branching structure needs at least {} choice point(s), found {}",
                MIN_BRANCH_POINTS, branch_points
            ));
        }

        let metrics = StructureMetrics {
            node_count: nodes.len(),
            edge_count: connections.len(),
            average_out_degree: if nodes.is_empty() {
                0.0
            } else {
                connections.len() as f64 / nodes.len() as f64
            },
            branch_points,
            isolated_nodes: isolated.len(),
        };

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            metrics,
        }
    }
}

impl Default for StructureValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::EncounterType;

    fn node(title: &str) -> EncounterNode {
        EncounterNode::new(title, EncounterType::Combat)
    }

    fn ending(title: &str) -> EncounterNode {
        EncounterNode::new(title, EncounterType::Social).as_ending()
    }

    #[test]
    fn test_single_isolated_node_flagged() {
        let nodes = vec![node("Lonely Scene")];
        let result = StructureValidator::new().validate(&nodes, &[], StructureHint::Flexible);

        assert!(!result.valid);
        assert_eq!(result.metrics.isolated_nodes, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("isolated"));
    }

    #[test]
    fn test_single_isolated_ending_is_tolerated() {
        let nodes = vec![ending("Epilogue")];
        let result = StructureValidator::new().validate(&nodes, &[], StructureHint::Flexible);

        assert!(result.valid);
        assert_eq!(result.metrics.isolated_nodes, 1);
    }

    #[test]
    fn test_non_ending_dead_end_rejected() {
        let a = node("Start");
        let b = node("Middle"); // no outgoing edge, not an ending
        let conn = Connection::flow(a.id, b.id).unwrap();
        let nodes = vec![a, b];

        let result = StructureValidator::new().validate(&nodes, &[conn], StructureHint::Flexible);
        assert!(!result.valid);
        assert!(result.errors[0].contains("no outgoing connection"));
    }

    #[test]
    fn test_linear_chain_to_ending_is_valid() {
        let a = node("Start");
        let b = node("Middle");
        let c = ending("Finale");
        let connections = vec![
            Connection::flow(a.id, b.id).unwrap(),
            Connection::flow(b.id, c.id).unwrap(),
        ];
        let nodes = vec![a, b, c];

        let result = StructureValidator::new().validate(&nodes, &connections, StructureHint::Linear);
        assert!(result.valid, "errors: {:?}", result.errors);
        assert_eq!(result.metrics.node_count, 3);
        assert_eq!(result.metrics.edge_count, 2);
        assert_eq!(result.metrics.branch_points, 0);
    }

    #[test]
    fn test_branching_hint_requires_choice_point() {
        let a = node("Start");
        let b = node("Middle");
        let c = ending("Finale");
        let connections = vec![
            Connection::flow(a.id, b.id).unwrap(),
            Connection::flow(b.id, c.id).unwrap(),
        ];
        let nodes = vec![a.clone(), b.clone(), c.clone()];

        let linear_as_branching =
            StructureValidator::new().validate(&nodes, &connections, StructureHint::Branching);
        assert!(!linear_as_branching.valid);

        // Add a second path out of the start node
        let d = ending("Secret Exit");
        let mut connections = connections;
        connections.push(Connection::flow(a.id, d.id).unwrap());
        let nodes = vec![a, b, c, d];

        let branched =
            StructureValidator::new().validate(&nodes, &connections, StructureHint::Branching);
        assert!(branched.valid, "errors: {:?}", branched.errors);
        assert_eq!(branched.metrics.branch_points, 1);
    }

    #[test]
    fn test_dangling_edge_reported() {
        let a = node("Start");
        let ghost = node("Never Added");
        let conn = Connection::flow(a.id, ghost.id).unwrap();
        let nodes = vec![a]; // ghost not in the node set

        let result = StructureValidator::new().validate(&nodes, &[conn], StructureHint::Flexible);
        assert!(!result.valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("unknown node")));
    }

    #[test]
    fn test_idempotent() {
        let a = node("Start");
        let b = ending("End");
        let connections = vec![Connection::flow(a.id, b.id).unwrap()];
        let nodes = vec![a, b];

        let validator = StructureValidator::new();
        let first = validator.validate(&nodes, &connections, StructureHint::Flexible);
        let second = validator.validate(&nodes, &connections, StructureHint::Flexible);
        assert_eq!(first, second);
    }

    #[test]
    fn test_metrics_computed_even_when_invalid() {
        let nodes = vec![node("A"), node("B")];
        let result = StructureValidator::new().validate(&nodes, &[], StructureHint::Flexible);

        assert!(!result.valid);
        assert_eq!(result.metrics.node_count, 2);
        assert_eq!(result.metrics.edge_count, 0);
        assert_eq!(result.metrics.isolated_nodes, 2);
        assert_eq!(result.metrics.average_out_degree, 0.0);
    }
}
