//! Application services - the deterministic engine and the orchestrator

pub mod combo_generator;
pub mod monster_filter;
pub mod orchestrator;
pub mod prompt_builder;
pub mod structure_validator;

pub use combo_generator::{
    ComboGenerator, ComboOption, ComboPick, MAX_CREATURES, MAX_CR_ZERO, MAX_STAT_BLOCKS,
    TOP_COMBO_LIMIT,
};
pub use monster_filter::{
    FilterOutcome, MonsterFilter, CANDIDATE_CEILING, MIN_KEYWORD_SURVIVORS, PER_CR_CAP,
};
pub use orchestrator::{
    is_affirmative, AdventureSession, MonsterProposalFlow, OrchestratorError,
    PendingThemeConfirmation, ProposalOrchestrator, ProposalPhase, ThemeDecision,
};
pub use prompt_builder::PromptBuilder;
pub use structure_validator::{
    StructureHint, StructureMetrics, StructureValidator, ValidationResult,
};
