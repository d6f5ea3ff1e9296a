//! Value objects - Immutable domain values with no identity

mod budget;
mod challenge_rating;
mod ids;

pub use budget::{xp_budget, DifficultyTier, PartyProfile, XpWindow};
pub use challenge_rating::{ChallengeRating, CrParseError};
pub use ids::{
    AdventureId, ConnectionId, EncounterId, NpcId, ProposalId, RewardId, SessionId,
};
