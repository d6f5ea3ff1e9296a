//! Connections between encounter nodes
//!
//! Flow through the adventure always runs out of a node's right side and
//! into the next node's left side. That rule is enforced at construction so
//! an ill-directed connection can never exist, not merely be flagged later.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ConnectionId, EncounterId};

/// Which side of a node an endpoint attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// A directed edge between two encounter nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: EncounterId,
    pub from_side: Side,
    pub to: EncounterId,
    pub to_side: Side,
}

impl Connection {
    /// Create a connection, enforcing the right→left flow rule
    pub fn new(
        from: EncounterId,
        from_side: Side,
        to: EncounterId,
        to_side: Side,
    ) -> Result<Self, ConnectionError> {
        if from_side != Side::Right || to_side != Side::Left {
            return Err(ConnectionError::WrongDirection { from_side, to_side });
        }
        if from == to {
            return Err(ConnectionError::SelfLoop(from));
        }
        Ok(Self {
            id: ConnectionId::new(),
            from,
            from_side,
            to,
            to_side,
        })
    }

    /// The common case: right side of `from` into left side of `to`
    pub fn flow(from: EncounterId, to: EncounterId) -> Result<Self, ConnectionError> {
        Self::new(from, Side::Right, to, Side::Left)
    }
}

/// Reasons a connection cannot be constructed
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("connections must run from a right side into a left side (got {from_side:?} -> {to_side:?})")]
    WrongDirection { from_side: Side, to_side: Side },
    #[error("a node cannot connect to itself: {0}")]
    SelfLoop(EncounterId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_to_left_is_the_only_valid_direction() {
        let a = EncounterId::new();
        let b = EncounterId::new();

        assert!(Connection::new(a, Side::Right, b, Side::Left).is_ok());
        assert!(Connection::new(a, Side::Left, b, Side::Right).is_err());
        assert!(Connection::new(a, Side::Right, b, Side::Right).is_err());
        assert!(Connection::new(a, Side::Left, b, Side::Left).is_err());
    }

    #[test]
    fn test_self_loops_rejected() {
        let a = EncounterId::new();
        assert!(matches!(
            Connection::flow(a, a),
            Err(ConnectionError::SelfLoop(_))
        ));
    }
}
