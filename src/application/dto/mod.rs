//! Data Transfer Objects - For API and generator boundaries
//!
//! DTOs live in the application layer so infrastructure (HTTP, generator
//! client) can serialize/deserialize without the domain model knowing about
//! wire formats.

pub mod proposals;

pub use proposals::{
    decode_proposal, CardDto, CardEditDto, ConnectionDto, GeneratorProposalDto,
    KeywordSuggestionDto, MonsterPickDto, MonsterProposalDto, ProposalDecodeError,
    StructureProposalDto,
};
