//! Domain entities - Objects with identity and lifecycle

mod adventure;
mod connection;
mod encounter;
mod monster;
mod proposal;

pub use adventure::{Adventure, AdventureError};
pub use connection::{Connection, ConnectionError, Side};
pub use encounter::{CreatureAssignment, EncounterNode, EncounterType, Position};
pub use monster::{CombatRole, MonsterCatalog, MonsterMetadata};
pub use proposal::{NodeEdit, Proposal, ProposalKind, ProposalStatus, StructureDelta};
