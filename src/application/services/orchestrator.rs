//! Proposal orchestrator - request → validate → retry → accept/reject
//!
//! Drives the protocol that treats the external generator as an untrusted
//! oracle: every response is parsed strictly, validated against the engine's
//! own invariants, retried at most once with corrective feedback, and then
//! presented to the user - with a visible warning when still invalid, never
//! silently corrected or discarded.
//!
//! The retry budget is a single configurable parameter consumed here and
//! nowhere else; individual call sites never roll their own retry loops.

use std::sync::Arc;

use serde::Serialize;

use crate::application::dto::{decode_proposal, GeneratorProposalDto, MonsterProposalDto};
use crate::application::ports::outbound::{ChatMessage, GeneratorPort, GeneratorRequest};
use crate::application::services::combo_generator::{ComboGenerator, MAX_CREATURES};
use crate::application::services::monster_filter::MonsterFilter;
use crate::application::services::prompt_builder::PromptBuilder;
use crate::application::services::structure_validator::{
    StructureHint, StructureValidator, ValidationResult,
};
use crate::domain::entities::{
    Adventure, AdventureError, CreatureAssignment, MonsterCatalog, MonsterMetadata, Proposal,
    ProposalKind, ProposalStatus, StructureDelta,
};
use crate::domain::value_objects::{
    xp_budget, DifficultyTier, EncounterId, PartyProfile, ProposalId, SessionId, XpWindow,
};

/// Pipeline phase, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalPhase {
    Drafting,
    Parsing,
    Validating,
    Retrying,
    AwaitingThemeConfirmation,
    Presented,
    Accepted,
    Rejected,
    Failed,
}

/// Per-user session state: the committed adventure plus proposal history
#[derive(Debug)]
pub struct AdventureSession {
    pub id: SessionId,
    pub adventure: Adventure,
    proposals: Vec<Proposal>,
    live_proposal: Option<ProposalId>,
    pending_theme: Option<PendingThemeConfirmation>,
}

impl AdventureSession {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            adventure: Adventure::new(title),
            proposals: Vec::new(),
            live_proposal: None,
            pending_theme: None,
        }
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn pending_theme(&self) -> Option<&PendingThemeConfirmation> {
        self.pending_theme.as_ref()
    }

    fn present(&mut self, proposal: Proposal) -> Proposal {
        self.live_proposal = Some(proposal.id);
        self.proposals.push(proposal.clone());
        proposal
    }
}

/// Theme-confirmation sub-state: keywords suggested, pipeline paused until
/// the user approves or replaces them
#[derive(Debug, Clone)]
pub struct PendingThemeConfirmation {
    pub encounter_id: EncounterId,
    pub party: PartyProfile,
    pub tier: DifficultyTier,
    pub user_request: String,
    pub keywords: Vec<String>,
    pub reasoning: String,
    /// Candidates already narrowed with the suggested keywords; an approval
    /// resumes from these without re-running the filter
    pub candidates: Vec<MonsterMetadata>,
}

/// User decision on suggested theme keywords
#[derive(Debug, Clone)]
pub enum ThemeDecision {
    /// Keep the suggested keywords and resume
    Approve,
    /// Substitute the user's own keywords and re-filter
    Replace(Vec<String>),
}

/// Whether a free-text utterance reads as approval ("go ahead", "yes", ...)
pub fn is_affirmative(text: &str) -> bool {
    const PHRASES: [&str; 5] = ["go ahead", "sounds good", "looks good", "do it", "that works"];
    const WORDS: [&str; 9] = [
        "yes", "yep", "yeah", "sure", "ok", "okay", "proceed", "confirm", "affirmative",
    ];

    let lower = text.to_lowercase();
    if PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| WORDS.contains(&word))
}

/// Result of starting a monster proposal
#[derive(Debug, Clone)]
pub enum MonsterProposalFlow {
    /// Pool was too large; keywords suggested and awaiting confirmation
    AwaitingThemeConfirmation {
        keywords: Vec<String>,
        reasoning: String,
    },
    /// A proposal is pending user accept/reject
    Presented(Proposal),
}

/// Errors surfaced by the orchestrator. Recoverable conditions
/// (budget mismatch, invalid structure) are consumed by the retry path and
/// become warnings instead; these are the terminal failures.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("generator response could not be parsed: {detail}")]
    ParseFailure {
        detail: String,
        /// The raw response, preserved verbatim for diagnosis
        raw: String,
    },
    #[error("no balanced combination found for the target window")]
    NoViableCombo,
    #[error("generator error: {0}")]
    GeneratorFailure(String),
    #[error("another proposal is already pending for this session")]
    ProposalInFlight,
    #[error("no such encounter: {0}")]
    UnknownEncounter(EncounterId),
    #[error("encounter {0} does not take a creature line-up")]
    NotCombatLike(EncounterId),
    #[error("no such proposal: {0}")]
    UnknownProposal(ProposalId),
    #[error("proposal {0} is already resolved")]
    AlreadyResolved(ProposalId),
    #[error("proposal {0} is stale; only the live pending proposal can be accepted")]
    StaleProposal(ProposalId),
    #[error("no theme confirmation is pending for this session")]
    NoThemePending,
    #[error("failed to commit proposal: {0}")]
    CommitFailed(#[from] AdventureError),
}

/// Orchestrates the proposal protocol against a generator port
pub struct ProposalOrchestrator<G: GeneratorPort> {
    generator: Arc<G>,
    filter: MonsterFilter,
    combos: ComboGenerator,
    validator: StructureValidator,
    prompts: PromptBuilder,
    /// Corrective re-invocations allowed per proposal request
    retry_budget: u32,
}

impl<G: GeneratorPort> ProposalOrchestrator<G> {
    pub fn new(generator: Arc<G>, retry_budget: u32) -> Self {
        Self {
            generator,
            filter: MonsterFilter::new(),
            combos: ComboGenerator::new(),
            validator: StructureValidator::new(),
            prompts: PromptBuilder::new(),
            retry_budget,
        }
    }

    // ------------------------------------------------------------------
    // Structure proposals
    // ------------------------------------------------------------------

    /// Run the structure-proposal pipeline for a user request.
    ///
    /// Returns the presented proposal; its warnings are non-empty when
    /// validation still failed after the retry.
    pub async fn propose_structure(
        &self,
        session: &mut AdventureSession,
        user_request: &str,
        hint: StructureHint,
    ) -> Result<Proposal, OrchestratorError> {
        if session.live_proposal.is_some() {
            return Err(OrchestratorError::ProposalInFlight);
        }

        self.log_phase(session.id, ProposalPhase::Drafting);
        let initial = self.prompts.structure_request(&session.adventure, user_request);
        let mut conversation = vec![ChatMessage::user(initial)];
        let mut raw = self.call_generator(&conversation).await?;

        let existing: Vec<EncounterId> = session.adventure.nodes().map(|n| n.id).collect();
        let mut retries_used = 0u32;
        let (delta, explanation, warnings) = loop {
            self.log_phase(session.id, ProposalPhase::Parsing);
            let parsed = self.parse_structure(&raw, &existing);

            let feedback = match parsed {
                Ok((delta, explanation)) => {
                    self.log_phase(session.id, ProposalPhase::Validating);
                    let result = self.validate_merged(&session.adventure, &delta, hint);
                    if result.valid {
                        break (delta, explanation, Vec::new());
                    }
                    if retries_used >= self.retry_budget {
                        // Out of retries: present anyway, visibly flagged
                        break (delta, explanation, result.errors);
                    }
                    self.prompts.structure_retry(&result.errors, &result.metrics)
                }
                Err(detail) => {
                    if retries_used >= self.retry_budget {
                        self.log_phase(session.id, ProposalPhase::Failed);
                        return Err(OrchestratorError::ParseFailure { detail, raw });
                    }
                    self.prompts.parse_retry(&detail)
                }
            };

            self.log_phase(session.id, ProposalPhase::Retrying);
            retries_used += 1;
            conversation.push(ChatMessage::assistant(raw));
            conversation.push(ChatMessage::user(feedback));
            raw = self.call_generator(&conversation).await?;
        };

        self.log_phase(session.id, ProposalPhase::Presented);
        let mut proposal = Proposal::pending(ProposalKind::Structure { delta, explanation })
            .with_warnings(warnings);
        proposal.retries_used = retries_used;
        Ok(session.present(proposal))
    }

    fn parse_structure(
        &self,
        raw: &str,
        existing: &[EncounterId],
    ) -> Result<(StructureDelta, String), String> {
        match decode_proposal(raw) {
            Ok(GeneratorProposalDto::Structure(dto)) => {
                let explanation = dto.explanation.clone();
                dto.into_delta(existing)
                    .map(|delta| (delta, explanation))
                    .map_err(|e| e.to_string())
            }
            Ok(other) => Err(format!(
                "expected a structure proposal, got {:?} schema",
                schema_name(&other)
            )),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Validate the candidate state: existing structure plus the delta
    fn validate_merged(
        &self,
        adventure: &Adventure,
        delta: &StructureDelta,
        hint: StructureHint,
    ) -> ValidationResult {
        let mut candidate = adventure.clone();
        if let Err(e) = candidate.apply_delta(delta.clone()) {
            // An unresolvable delta is reported the same way as a graph
            // violation so the retry prompt can enumerate it
            let nodes: Vec<_> = adventure.nodes().cloned().collect();
            let mut result =
                self.validator
                    .validate(&nodes, adventure.connections(), hint);
            result.valid = false;
            result.errors.push(e.to_string());
            return result;
        }
        let nodes: Vec<_> = candidate.nodes().cloned().collect();
        self.validator.validate(&nodes, candidate.connections(), hint)
    }

    // ------------------------------------------------------------------
    // Monster proposals
    // ------------------------------------------------------------------

    /// Run the monster-proposal pipeline for one encounter.
    ///
    /// May pause in the theme-confirmation sub-state when the candidate
    /// pool is large; resume with [`Self::confirm_theme`].
    pub async fn propose_monsters(
        &self,
        session: &mut AdventureSession,
        catalog: &MonsterCatalog,
        encounter_id: EncounterId,
        party: PartyProfile,
        tier: DifficultyTier,
        user_request: &str,
    ) -> Result<MonsterProposalFlow, OrchestratorError> {
        if session.live_proposal.is_some() {
            return Err(OrchestratorError::ProposalInFlight);
        }

        let encounter = session
            .adventure
            .node(encounter_id)
            .ok_or(OrchestratorError::UnknownEncounter(encounter_id))?;
        if !encounter.supports_creatures() {
            return Err(OrchestratorError::NotCombatLike(encounter_id));
        }
        let encounter = encounter.clone();

        let party = party.clamped();
        let budget = xp_budget(party, tier);
        let outcome =
            self.filter
                .filter(catalog, budget, party, encounter.encounter_type, None);

        if outcome.needs_keywords {
            self.log_phase(session.id, ProposalPhase::AwaitingThemeConfirmation);
            let (keywords, reasoning) = self
                .suggest_keywords(catalog, &encounter, user_request)
                .await?;
            let narrowed = self.filter.filter(
                catalog,
                budget,
                party,
                encounter.encounter_type,
                Some(&keywords),
            );
            session.pending_theme = Some(PendingThemeConfirmation {
                encounter_id,
                party,
                tier,
                user_request: user_request.to_string(),
                keywords: keywords.clone(),
                reasoning: reasoning.clone(),
                candidates: narrowed.candidates,
            });
            return Ok(MonsterProposalFlow::AwaitingThemeConfirmation { keywords, reasoning });
        }

        let proposal = self
            .run_monster_pipeline(session, &outcome.candidates, encounter_id, party, tier, budget)
            .await?;
        Ok(MonsterProposalFlow::Presented(proposal))
    }

    /// Resume a paused monster pipeline after the user's theme decision.
    ///
    /// Approval reuses the previously narrowed candidates without
    /// re-issuing the filter step; replacement keywords re-run the filter.
    pub async fn confirm_theme(
        &self,
        session: &mut AdventureSession,
        catalog: &MonsterCatalog,
        decision: ThemeDecision,
    ) -> Result<MonsterProposalFlow, OrchestratorError> {
        let pending = session
            .pending_theme
            .take()
            .ok_or(OrchestratorError::NoThemePending)?;

        let budget = xp_budget(pending.party, pending.tier);
        let candidates = match decision {
            ThemeDecision::Approve => pending.candidates,
            ThemeDecision::Replace(keywords) => {
                let encounter = session
                    .adventure
                    .node(pending.encounter_id)
                    .ok_or(OrchestratorError::UnknownEncounter(pending.encounter_id))?;
                self.filter
                    .filter(
                        catalog,
                        budget,
                        pending.party,
                        encounter.encounter_type,
                        Some(&keywords),
                    )
                    .candidates
            }
        };

        let proposal = self
            .run_monster_pipeline(
                session,
                &candidates,
                pending.encounter_id,
                pending.party,
                pending.tier,
                budget,
            )
            .await?;
        Ok(MonsterProposalFlow::Presented(proposal))
    }

    async fn run_monster_pipeline(
        &self,
        session: &mut AdventureSession,
        candidates: &[MonsterMetadata],
        encounter_id: EncounterId,
        party: PartyProfile,
        tier: DifficultyTier,
        budget: u32,
    ) -> Result<Proposal, OrchestratorError> {
        let window = XpWindow::around(budget);
        let combos = self.combos.generate(candidates, budget, party, window);
        if combos.is_empty() {
            // A deterministic search failure, not a generator mistake:
            // never retried against the generator
            self.log_phase(session.id, ProposalPhase::Failed);
            return Err(OrchestratorError::NoViableCombo);
        }

        let encounter = session
            .adventure
            .node(encounter_id)
            .ok_or(OrchestratorError::UnknownEncounter(encounter_id))?
            .clone();

        self.log_phase(session.id, ProposalPhase::Drafting);
        let initial = self.prompts.monster_request(
            &encounter, party, tier, budget, window, candidates, &combos,
        );
        let mut conversation = vec![ChatMessage::user(initial)];
        let mut raw = self.call_generator(&conversation).await?;

        let mut retries_used = 0u32;
        let (creatures, total_xp, explanation, warnings) = loop {
            self.log_phase(session.id, ProposalPhase::Parsing);
            let parsed = self.parse_monsters(&raw, encounter_id);

            let feedback = match parsed {
                Ok(dto) => {
                    self.log_phase(session.id, ProposalPhase::Validating);
                    match self.check_lineup(&dto, candidates, party, window) {
                        LineupCheck::Ok {
                            creatures,
                            total_xp,
                            warnings,
                        } => break (creatures, total_xp, dto.explanation, warnings),
                        LineupCheck::OutOfWindow {
                            creatures,
                            total_xp,
                            mut warnings,
                        } => {
                            if retries_used >= self.retry_budget {
                                warnings.push(format!(
                                    "total {} XP falls outside the {}-{} window",
                                    total_xp, window.min, window.max
                                ));
                                break (creatures, total_xp, dto.explanation, warnings);
                            }
                            let chosen: Vec<(String, String, u32)> = dto
                                .monsters
                                .iter()
                                .map(|m| (m.name.clone(), m.cr.token(), m.count))
                                .collect();
                            self.prompts
                                .budget_retry(&chosen, dto.total_xp, total_xp, window)
                        }
                        LineupCheck::Unusable(detail) => {
                            if retries_used >= self.retry_budget {
                                self.log_phase(session.id, ProposalPhase::Failed);
                                return Err(OrchestratorError::ParseFailure { detail, raw });
                            }
                            self.prompts.parse_retry(&detail)
                        }
                    }
                }
                Err(detail) => {
                    if retries_used >= self.retry_budget {
                        self.log_phase(session.id, ProposalPhase::Failed);
                        return Err(OrchestratorError::ParseFailure { detail, raw });
                    }
                    self.prompts.parse_retry(&detail)
                }
            };

            self.log_phase(session.id, ProposalPhase::Retrying);
            retries_used += 1;
            conversation.push(ChatMessage::assistant(raw));
            conversation.push(ChatMessage::user(feedback));
            raw = self.call_generator(&conversation).await?;
        };

        self.log_phase(session.id, ProposalPhase::Presented);
        let mut proposal = Proposal::pending(ProposalKind::Monsters {
            encounter_id,
            creatures,
            total_xp,
            explanation,
        })
        .with_warnings(warnings);
        proposal.retries_used = retries_used;
        Ok(session.present(proposal))
    }

    fn parse_monsters(
        &self,
        raw: &str,
        encounter_id: EncounterId,
    ) -> Result<MonsterProposalDto, String> {
        match decode_proposal(raw) {
            Ok(GeneratorProposalDto::Monsters(dto)) => {
                if EncounterId::from_uuid(dto.encounter_id) != encounter_id {
                    return Err(format!(
                        "proposal targets encounter {}, expected {}",
                        dto.encounter_id, encounter_id
                    ));
                }
                if dto.monsters.is_empty() {
                    return Err("proposal contains no creatures".to_string());
                }
                Ok(dto)
            }
            Ok(other) => Err(format!(
                "expected a monster proposal, got {:?} schema",
                schema_name(&other)
            )),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Recompute the authoritative total and validate the line-up.
    ///
    /// The generator's self-reported totalXP is only ever used in the
    /// mismatch diagnostic; the committed total is always the recomputed
    /// one.
    fn check_lineup(
        &self,
        dto: &MonsterProposalDto,
        candidates: &[MonsterMetadata],
        party: PartyProfile,
        window: XpWindow,
    ) -> LineupCheck {
        let mut creatures = Vec::with_capacity(dto.monsters.len());
        let mut total_xp = 0u32;
        let mut warnings = Vec::new();

        for pick in &dto.monsters {
            let Some(monster) = candidates.iter().find(|c| c.file == pick.filename) else {
                return LineupCheck::Unusable(format!(
                    "{:?} is not in the candidate list",
                    pick.filename
                ));
            };
            // The count is generator-supplied and unbounded; anything past
            // the horde limit can never validate and would let the total
            // arithmetic run away
            if pick.count == 0 || pick.count > MAX_CREATURES {
                return LineupCheck::Unusable(format!(
                    "{} has count {}, outside the allowed 1-{} range",
                    monster.name, pick.count, MAX_CREATURES
                ));
            }
            if monster.cr != pick.cr {
                warnings.push(format!(
                    "catalog lists {} as CR {}, not CR {}; using the catalog value",
                    monster.name, monster.cr, pick.cr
                ));
            }
            if monster.cr.effective_level() > party.level {
                warnings.push(format!(
                    "{} is CR {} against a level {} party - it may one-shot a character",
                    monster.name, monster.cr, party.level
                ));
            }
            total_xp = total_xp.saturating_add(monster.xp().saturating_mul(pick.count));
            creatures.push(CreatureAssignment {
                file: monster.file.clone(),
                name: monster.name.clone(),
                count: pick.count,
            });
        }

        if dto.total_xp != total_xp {
            tracing::warn!(
                reported = dto.total_xp,
                computed = total_xp,
                "generator-reported XP disagrees with the CR table; overriding"
            );
        }

        if window.contains(total_xp) {
            LineupCheck::Ok {
                creatures,
                total_xp,
                warnings,
            }
        } else {
            LineupCheck::OutOfWindow {
                creatures,
                total_xp,
                warnings,
            }
        }
    }

    /// Obtain 3-5 theme keywords, validated against the catalog's taxonomy
    async fn suggest_keywords(
        &self,
        catalog: &MonsterCatalog,
        encounter: &crate::domain::entities::EncounterNode,
        user_request: &str,
    ) -> Result<(Vec<String>, String), OrchestratorError> {
        let prompt =
            self.prompts
                .keyword_request(encounter, user_request, &catalog.theme_keywords);
        let mut conversation = vec![ChatMessage::user(prompt)];
        let mut raw = self.call_generator(&conversation).await?;

        let mut retries_used = 0u32;
        loop {
            let detail = match decode_proposal(&raw) {
                Ok(GeneratorProposalDto::Keywords(dto)) => {
                    let known: Vec<String> = dto
                        .keywords
                        .iter()
                        .filter(|k| catalog.is_known_keyword(k))
                        .cloned()
                        .collect();
                    if !known.is_empty() {
                        return Ok((known, dto.reasoning));
                    }
                    "none of the suggested keywords exist in the catalog taxonomy".to_string()
                }
                Ok(other) => format!(
                    "expected a keyword suggestion, got {:?} schema",
                    schema_name(&other)
                ),
                Err(e) => e.to_string(),
            };

            if retries_used >= self.retry_budget {
                return Err(OrchestratorError::ParseFailure { detail, raw });
            }
            retries_used += 1;
            conversation.push(ChatMessage::assistant(raw));
            conversation.push(ChatMessage::user(self.prompts.parse_retry(&detail)));
            raw = self.call_generator(&conversation).await?;
        }
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Accept the live pending proposal and commit it atomically.
    ///
    /// Only the session's live proposal can be accepted; a stale id (for
    /// example one rejected while a newer request was in flight) is
    /// refused, which is how eventual responses from abandoned pipelines
    /// are ignored.
    pub fn accept(
        &self,
        session: &mut AdventureSession,
        proposal_id: ProposalId,
    ) -> Result<(), OrchestratorError> {
        let proposal = session
            .proposal(proposal_id)
            .ok_or(OrchestratorError::UnknownProposal(proposal_id))?;
        if !proposal.is_pending() {
            return Err(OrchestratorError::AlreadyResolved(proposal_id));
        }
        if session.live_proposal != Some(proposal_id) {
            return Err(OrchestratorError::StaleProposal(proposal_id));
        }

        let kind = proposal.kind.clone();
        match kind {
            ProposalKind::Structure { delta, .. } => {
                session.adventure.apply_delta(delta)?;
            }
            ProposalKind::Monsters {
                encounter_id,
                creatures,
                ..
            } => {
                session.adventure.assign_creatures(encounter_id, creatures)?;
            }
            ProposalKind::Keywords { .. } => {
                // Keyword suggestions resolve through confirm_theme, not here
                return Err(OrchestratorError::StaleProposal(proposal_id));
            }
        }

        self.resolve(session, proposal_id, ProposalStatus::Accepted);
        self.log_phase(session.id, ProposalPhase::Accepted);
        Ok(())
    }

    /// Reject a pending proposal, discarding it with no side effects
    pub fn reject(
        &self,
        session: &mut AdventureSession,
        proposal_id: ProposalId,
    ) -> Result<(), OrchestratorError> {
        let proposal = session
            .proposal(proposal_id)
            .ok_or(OrchestratorError::UnknownProposal(proposal_id))?;
        if !proposal.is_pending() {
            return Err(OrchestratorError::AlreadyResolved(proposal_id));
        }

        session.pending_theme = None;
        self.resolve(session, proposal_id, ProposalStatus::Rejected);
        self.log_phase(session.id, ProposalPhase::Rejected);
        Ok(())
    }

    fn resolve(&self, session: &mut AdventureSession, id: ProposalId, status: ProposalStatus) {
        if let Some(proposal) = session.proposals.iter_mut().find(|p| p.id == id) {
            proposal.resolve(status);
        }
        if session.live_proposal == Some(id) {
            session.live_proposal = None;
        }
    }

    async fn call_generator(
        &self,
        conversation: &[ChatMessage],
    ) -> Result<String, OrchestratorError> {
        let request = GeneratorRequest::new(conversation.to_vec())
            .with_system_prompt(self.prompts.system_prompt())
            .with_temperature(0.7);
        let response = self
            .generator
            .generate(request)
            .await
            .map_err(|e| OrchestratorError::GeneratorFailure(e.to_string()))?;
        Ok(response.content)
    }

    fn log_phase(&self, session: SessionId, phase: ProposalPhase) {
        tracing::debug!(%session, ?phase, "proposal phase");
    }
}

/// Outcome of line-up validation
enum LineupCheck {
    Ok {
        creatures: Vec<CreatureAssignment>,
        total_xp: u32,
        warnings: Vec<String>,
    },
    OutOfWindow {
        creatures: Vec<CreatureAssignment>,
        total_xp: u32,
        warnings: Vec<String>,
    },
    /// Line-up references creatures the engine never offered, or is empty
    Unusable(String),
}

fn schema_name(dto: &GeneratorProposalDto) -> &'static str {
    match dto {
        GeneratorProposalDto::Structure(_) => "structure",
        GeneratorProposalDto::Monsters(_) => "monsters",
        GeneratorProposalDto::Keywords(_) => "keywords",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::application::ports::outbound::GeneratorResponse;
    use crate::domain::entities::{CombatRole, EncounterNode, EncounterType};
    use crate::domain::value_objects::ChallengeRating;

    /// Generator that replays a fixed script of responses
    struct ScriptedGenerator {
        responses: std::sync::Mutex<VecDeque<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<String>) -> Self {
            Self {
                responses: std::sync::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeneratorPort for ScriptedGenerator {
        type Error = std::io::Error;

        async fn generate(
            &self,
            _request: GeneratorRequest,
        ) -> Result<GeneratorResponse, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let content = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| std::io::Error::other("script exhausted"))?;
            Ok(GeneratorResponse {
                content,
                model: "scripted".to_string(),
            })
        }
    }

    fn orchestrator(
        responses: Vec<String>,
    ) -> (ProposalOrchestrator<ScriptedGenerator>, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator::new(responses));
        (ProposalOrchestrator::new(generator.clone(), 1), generator)
    }

    fn monster(name: &str, cr: ChallengeRating) -> MonsterMetadata {
        MonsterMetadata {
            file: format!("{}.html", name.to_lowercase().replace(' ', "-")),
            name: name.to_string(),
            cr,
            creature_type: "Monstrosity".to_string(),
            combat_role: CombatRole::Striker,
            theme_keywords: vec!["undead".to_string()],
            summary: String::new(),
        }
    }

    fn small_catalog() -> MonsterCatalog {
        MonsterCatalog {
            monsters: vec![
                monster("Owlbear", ChallengeRating::Whole(3)),
                monster("Ettin", ChallengeRating::Whole(4)),
                monster("Hill Giant", ChallengeRating::Whole(5)),
            ],
            theme_keywords: vec!["undead".to_string(), "wilderness".to_string()],
        }
    }

    fn combat_session() -> (AdventureSession, EncounterId) {
        let mut session = AdventureSession::new("Test Adventure");
        let node = EncounterNode::new("Bridge Ambush", EncounterType::Combat).as_ending();
        let id = node.id;
        session.adventure.add_node(node);
        (session, id)
    }

    fn valid_structure_response() -> String {
        r#"{
            "type": "structure",
            "cards_to_add": [
                {"id": "card-1", "title": "Village Gate", "encounter_type": "social"},
                {"id": "card-2", "title": "Final Stand", "encounter_type": "combat", "is_ending": true}
            ],
            "connections": [{"from": "card-1", "to": "card-2"}],
            "explanation": "A short two-scene arc"
        }"#
        .to_string()
    }

    fn dead_end_structure_response() -> String {
        // card-1 has no outgoing connection and is not an ending
        r#"{
            "type": "structure",
            "cards_to_add": [
                {"id": "card-1", "title": "Dead End", "encounter_type": "combat"}
            ],
            "connections": [],
            "explanation": "One dangling scene"
        }"#
        .to_string()
    }

    fn monster_response(encounter_id: EncounterId, total_xp: u32) -> String {
        format!(
            r#"{{
                "type": "monsters",
                "encounter_id": "{}",
                "monsters": [
                    {{"filename": "hill-giant.html", "name": "Hill Giant", "cr": "5", "count": 1, "reasoning": "anchor"}},
                    {{"filename": "ettin.html", "name": "Ettin", "cr": "4", "count": 1, "reasoning": "support"}}
                ],
                "totalXP": {},
                "explanation": "A giant and his pet"
            }}"#,
            encounter_id.as_uuid(),
            total_xp
        )
    }

    #[tokio::test]
    async fn test_valid_structure_accepted_and_committed() {
        let (orch, generator) = orchestrator(vec![valid_structure_response()]);
        let mut session = AdventureSession::new("Test");

        let proposal = orch
            .propose_structure(&mut session, "start a short adventure", StructureHint::Linear)
            .await
            .unwrap();

        assert!(proposal.warnings.is_empty());
        assert_eq!(proposal.retries_used, 0);
        assert_eq!(generator.calls(), 1);

        orch.accept(&mut session, proposal.id).unwrap();
        assert_eq!(session.adventure.node_count(), 2);
        assert_eq!(session.adventure.connections().len(), 1);
        assert_eq!(
            session.proposal(proposal.id).unwrap().status,
            ProposalStatus::Accepted
        );
    }

    #[tokio::test]
    async fn test_invalid_structure_retried_once_then_flagged() {
        // Both attempts propose a dead end; after the single retry the
        // proposal is presented with warnings rather than discarded
        let (orch, generator) = orchestrator(vec![
            dead_end_structure_response(),
            dead_end_structure_response(),
        ]);
        let mut session = AdventureSession::new("Test");

        let proposal = orch
            .propose_structure(&mut session, "add a scene", StructureHint::Flexible)
            .await
            .unwrap();

        assert_eq!(generator.calls(), 2, "exactly one corrective retry");
        assert_eq!(proposal.retries_used, 1);
        assert!(!proposal.warnings.is_empty());
        assert!(proposal.warnings[0].contains("isolated"));
        assert!(proposal.is_pending(), "still presented for user decision");
    }

    #[tokio::test]
    async fn test_invalid_structure_corrected_on_retry() {
        let (orch, generator) = orchestrator(vec![
            dead_end_structure_response(),
            valid_structure_response(),
        ]);
        let mut session = AdventureSession::new("Test");

        let proposal = orch
            .propose_structure(&mut session, "add scenes", StructureHint::Flexible)
            .await
            .unwrap();

        assert_eq!(generator.calls(), 2);
        assert!(proposal.warnings.is_empty());
        assert_eq!(proposal.retries_used, 1);
    }

    #[tokio::test]
    async fn test_unparseable_twice_surfaces_raw_response() {
        let (orch, _) = orchestrator(vec![
            "I will not answer in JSON.".to_string(),
            "Still prose, sorry.".to_string(),
        ]);
        let mut session = AdventureSession::new("Test");

        let err = orch
            .propose_structure(&mut session, "anything", StructureHint::Flexible)
            .await
            .unwrap_err();

        match err {
            OrchestratorError::ParseFailure { raw, .. } => {
                assert_eq!(raw, "Still prose, sorry.");
            }
            other => panic!("expected ParseFailure, got {other:?}"),
        }
        assert!(session.proposals().is_empty());
    }

    #[tokio::test]
    async fn test_reported_total_is_overridden_by_recomputation() {
        let (mut session, encounter_id) = combat_session();
        // Generator claims 9999 XP; the CR table says 1800 + 1100 = 2900
        let (orch, _) = orchestrator(vec![monster_response(encounter_id, 9_999)]);

        let flow = orch
            .propose_monsters(
                &mut session,
                &small_catalog(),
                encounter_id,
                PartyProfile::new(5, 4),
                DifficultyTier::Moderate,
                "giants in the hills",
            )
            .await
            .unwrap();

        let proposal = match flow {
            MonsterProposalFlow::Presented(p) => p,
            other => panic!("expected a presented proposal, got {other:?}"),
        };
        match &proposal.kind {
            ProposalKind::Monsters { total_xp, .. } => assert_eq!(*total_xp, 2_900),
            other => panic!("expected monsters kind, got {other:?}"),
        }

        orch.accept(&mut session, proposal.id).unwrap();
        let node = session.adventure.node(encounter_id).unwrap();
        assert_eq!(node.creatures.len(), 2);
    }

    #[tokio::test]
    async fn test_out_of_window_lineup_triggers_budget_retry() {
        let (mut session, encounter_id) = combat_session();
        let out_of_window = format!(
            r#"{{
                "type": "monsters",
                "encounter_id": "{}",
                "monsters": [
                    {{"filename": "owlbear.html", "name": "Owlbear", "cr": "3", "count": 1, "reasoning": "lone beast"}}
                ],
                "totalXP": 700,
                "explanation": "Too light for the party"
            }}"#,
            encounter_id.as_uuid()
        );
        let (orch, generator) = orchestrator(vec![
            out_of_window,
            monster_response(encounter_id, 2_900),
        ]);

        let flow = orch
            .propose_monsters(
                &mut session,
                &small_catalog(),
                encounter_id,
                PartyProfile::new(5, 4),
                DifficultyTier::Moderate,
                "something dangerous",
            )
            .await
            .unwrap();

        assert_eq!(generator.calls(), 2);
        let proposal = match flow {
            MonsterProposalFlow::Presented(p) => p,
            other => panic!("expected a presented proposal, got {other:?}"),
        };
        assert!(proposal.warnings.is_empty());
        match &proposal.kind {
            ProposalKind::Monsters { total_xp, .. } => assert_eq!(*total_xp, 2_900),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_runaway_creature_count_rejected_without_overflow() {
        let (mut session, encounter_id) = combat_session();
        // 3,000,000 Hill Giants would overflow a u32 XP total if multiplied
        // naively; the line-up must be refused as unusable instead
        let absurd = format!(
            r#"{{
                "type": "monsters",
                "encounter_id": "{}",
                "monsters": [
                    {{"filename": "hill-giant.html", "name": "Hill Giant", "cr": "5", "count": 3000000, "reasoning": "yes"}}
                ],
                "totalXP": 2900,
                "explanation": "A wall of giants"
            }}"#,
            encounter_id.as_uuid()
        );
        let (orch, generator) = orchestrator(vec![
            absurd,
            monster_response(encounter_id, 2_900),
        ]);

        let flow = orch
            .propose_monsters(
                &mut session,
                &small_catalog(),
                encounter_id,
                PartyProfile::new(5, 4),
                DifficultyTier::Moderate,
                "something big",
            )
            .await
            .unwrap();

        assert_eq!(generator.calls(), 2, "absurd count consumes the retry");
        match flow {
            MonsterProposalFlow::Presented(p) => match &p.kind {
                ProposalKind::Monsters { total_xp, .. } => assert_eq!(*total_xp, 2_900),
                other => panic!("unexpected kind {other:?}"),
            },
            other => panic!("expected a presented proposal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_viable_combo_is_not_retried_against_generator() {
        let (mut session, encounter_id) = combat_session();
        // Catalog holds only a creature far too big for the budget
        let catalog = MonsterCatalog {
            monsters: vec![monster("Hill Giant", ChallengeRating::Whole(5))],
            theme_keywords: vec![],
        };
        let (orch, generator) = orchestrator(vec![]);

        let err = orch
            .propose_monsters(
                &mut session,
                &catalog,
                encounter_id,
                PartyProfile::new(2, 4),
                DifficultyTier::Low,
                "anything",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::NoViableCombo));
        assert_eq!(generator.calls(), 0, "deterministic failure, no generator call");
    }

    #[tokio::test]
    async fn test_large_pool_pauses_for_theme_confirmation() {
        let (mut session, encounter_id) = combat_session();
        let monsters: Vec<_> = (0..120)
            .map(|i| {
                let mut m = monster(&format!("Creature {i:03}"), ChallengeRating::Whole(1 + (i % 5) as u8));
                m.file = format!("creature-{i:03}.html");
                m
            })
            .collect();
        let catalog = MonsterCatalog {
            monsters,
            theme_keywords: vec!["undead".to_string()],
        };

        let keyword_response =
            r#"{"type": "keywords", "keywords": ["undead"], "reasoning": "crypt request"}"#
                .to_string();
        let (orch, _) = orchestrator(vec![keyword_response]);

        let flow = orch
            .propose_monsters(
                &mut session,
                &catalog,
                encounter_id,
                PartyProfile::new(5, 4),
                DifficultyTier::Moderate,
                "fill the crypt",
            )
            .await
            .unwrap();

        match flow {
            MonsterProposalFlow::AwaitingThemeConfirmation { keywords, .. } => {
                assert_eq!(keywords, vec!["undead".to_string()]);
            }
            other => panic!("expected theme confirmation, got {other:?}"),
        }
        assert!(session.pending_theme().is_some());
        let cached = session.pending_theme().unwrap().candidates.len();
        assert!(cached > 0 && cached <= crate::application::services::CANDIDATE_CEILING);
    }

    #[tokio::test]
    async fn test_theme_approval_resumes_without_refiltering() {
        let (mut session, encounter_id) = combat_session();
        session.pending_theme = Some(PendingThemeConfirmation {
            encounter_id,
            party: PartyProfile::new(5, 4),
            tier: DifficultyTier::Moderate,
            user_request: "giants".to_string(),
            keywords: vec!["wilderness".to_string()],
            reasoning: "hill country".to_string(),
            candidates: small_catalog().monsters,
        });

        let (orch, generator) = orchestrator(vec![monster_response(encounter_id, 2_900)]);
        let flow = orch
            .confirm_theme(&mut session, &small_catalog(), ThemeDecision::Approve)
            .await
            .unwrap();

        assert!(matches!(flow, MonsterProposalFlow::Presented(_)));
        // Only the monster-proposal call; no keyword or filter round trips
        assert_eq!(generator.calls(), 1);
        assert!(session.pending_theme().is_none());
    }

    #[tokio::test]
    async fn test_confirm_without_pending_theme_errors() {
        let mut session = AdventureSession::new("Test");
        let (orch, _) = orchestrator(vec![]);
        let err = orch
            .confirm_theme(&mut session, &small_catalog(), ThemeDecision::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NoThemePending));
    }

    #[tokio::test]
    async fn test_reject_discards_without_side_effects() {
        let (orch, _) = orchestrator(vec![valid_structure_response()]);
        let mut session = AdventureSession::new("Test");

        let proposal = orch
            .propose_structure(&mut session, "scenes", StructureHint::Flexible)
            .await
            .unwrap();
        orch.reject(&mut session, proposal.id).unwrap();

        assert_eq!(session.adventure.node_count(), 0);
        assert_eq!(
            session.proposal(proposal.id).unwrap().status,
            ProposalStatus::Rejected
        );
        // A rejected proposal can no longer be accepted
        assert!(matches!(
            orch.accept(&mut session, proposal.id),
            Err(OrchestratorError::AlreadyResolved(_))
        ));
    }

    #[tokio::test]
    async fn test_second_request_refused_while_one_is_pending() {
        let (orch, _) = orchestrator(vec![valid_structure_response()]);
        let mut session = AdventureSession::new("Test");

        orch.propose_structure(&mut session, "scenes", StructureHint::Flexible)
            .await
            .unwrap();
        let err = orch
            .propose_structure(&mut session, "more scenes", StructureHint::Flexible)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ProposalInFlight));
    }

    #[test]
    fn test_affirmative_intent_matching() {
        assert!(is_affirmative("Go ahead!"));
        assert!(is_affirmative("yes please"));
        assert!(is_affirmative("ok"));
        assert!(is_affirmative("Sounds good to me"));
        assert!(!is_affirmative("no, use pirate themes instead"));
        assert!(!is_affirmative("what does urban mean here?"));
        // "ok" must match as a word, not inside another word
        assert!(!is_affirmative("broken"));
    }
}
