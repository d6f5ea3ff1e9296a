//! Proposal lifecycle routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::{
    is_affirmative, MonsterProposalFlow, OrchestratorError, StructureHint, ThemeDecision,
};
use crate::domain::entities::{MonsterCatalog, Proposal};
use crate::domain::value_objects::{DifficultyTier, EncounterId, PartyProfile, ProposalId};
use crate::infrastructure::http::session_routes::parse_session_id;
use crate::infrastructure::state::AppState;

/// Request to start a proposal pipeline
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartProposalRequest {
    Structure {
        request: String,
        #[serde(default)]
        hint: StructureHint,
    },
    Monsters {
        encounter_id: Uuid,
        level: u8,
        size: u8,
        tier: DifficultyTier,
        request: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProposalFlowResponse {
    /// Pipeline paused; the user must approve or replace the keywords
    AwaitingThemeConfirmation {
        keywords: Vec<String>,
        reasoning: String,
    },
    /// A proposal is pending accept/reject
    Presented { proposal: Proposal },
}

#[derive(Debug, Deserialize)]
pub struct ConfirmKeywordsRequest {
    /// Free-text user reply, matched for affirmative intent
    #[serde(default)]
    pub message: Option<String>,
    /// Explicit replacement keywords; takes precedence over the message
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ResolutionResponse {
    pub proposal_id: String,
    pub status: &'static str,
}

/// Start a proposal pipeline for a session
pub async fn start_proposal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StartProposalRequest>,
) -> Result<Json<ProposalFlowResponse>, (StatusCode, String)> {
    let session_id = parse_session_id(&id)?;
    let session = state
        .session(session_id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Session not found".to_string()))?;
    let mut session = session.lock().await;

    let response = match req {
        StartProposalRequest::Structure { request, hint } => {
            let proposal = state
                .orchestrator
                .propose_structure(&mut session, &request, hint)
                .await
                .map_err(map_orchestrator_error)?;
            state.index_proposal(proposal.id, session_id).await;
            ProposalFlowResponse::Presented { proposal }
        }
        StartProposalRequest::Monsters {
            encounter_id,
            level,
            size,
            tier,
            request,
        } => {
            let catalog = catalog(&state)?;
            let flow = state
                .orchestrator
                .propose_monsters(
                    &mut session,
                    catalog,
                    EncounterId::from_uuid(encounter_id),
                    PartyProfile::new(level, size),
                    tier,
                    &request,
                )
                .await
                .map_err(map_orchestrator_error)?;
            flow_response(&state, session_id, flow).await
        }
    };

    Ok(Json(response))
}

/// Resolve a pending theme confirmation and resume the monster pipeline
pub async fn confirm_keywords(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ConfirmKeywordsRequest>,
) -> Result<Json<ProposalFlowResponse>, (StatusCode, String)> {
    let session_id = parse_session_id(&id)?;
    let session = state
        .session(session_id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Session not found".to_string()))?;
    let mut session = session.lock().await;

    let decision = match (req.keywords, req.message) {
        (Some(keywords), _) if !keywords.is_empty() => ThemeDecision::Replace(keywords),
        (_, Some(message)) if is_affirmative(&message) => ThemeDecision::Approve,
        _ => {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                "Reply was not an approval; send replacement keywords instead".to_string(),
            ))
        }
    };

    let catalog = catalog(&state)?;
    let flow = state
        .orchestrator
        .confirm_theme(&mut session, catalog, decision)
        .await
        .map_err(map_orchestrator_error)?;

    Ok(Json(flow_response(&state, session_id, flow).await))
}

/// Accept a pending proposal and commit it to the adventure
pub async fn accept_proposal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ResolutionResponse>, (StatusCode, String)> {
    resolve_proposal(&state, &id, true).await
}

/// Reject a pending proposal, discarding it
pub async fn reject_proposal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ResolutionResponse>, (StatusCode, String)> {
    resolve_proposal(&state, &id, false).await
}

async fn resolve_proposal(
    state: &AppState,
    raw_id: &str,
    accept: bool,
) -> Result<Json<ResolutionResponse>, (StatusCode, String)> {
    let proposal_id = Uuid::parse_str(raw_id)
        .map(ProposalId::from_uuid)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid proposal ID".to_string()))?;

    let session_id = state
        .session_for_proposal(proposal_id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Proposal not found".to_string()))?;
    let session = state
        .session(session_id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Session not found".to_string()))?;
    let mut session = session.lock().await;

    let result = if accept {
        state.orchestrator.accept(&mut session, proposal_id)
    } else {
        state.orchestrator.reject(&mut session, proposal_id)
    };
    result.map_err(map_orchestrator_error)?;

    Ok(Json(ResolutionResponse {
        proposal_id: proposal_id.to_string(),
        status: if accept { "accepted" } else { "rejected" },
    }))
}

async fn flow_response(
    state: &AppState,
    session_id: crate::domain::value_objects::SessionId,
    flow: MonsterProposalFlow,
) -> ProposalFlowResponse {
    match flow {
        MonsterProposalFlow::AwaitingThemeConfirmation { keywords, reasoning } => {
            ProposalFlowResponse::AwaitingThemeConfirmation { keywords, reasoning }
        }
        MonsterProposalFlow::Presented(proposal) => {
            state.index_proposal(proposal.id, session_id).await;
            ProposalFlowResponse::Presented { proposal }
        }
    }
}

fn catalog(state: &AppState) -> Result<&MonsterCatalog, (StatusCode, String)> {
    state.catalog.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "Monster catalog is unavailable".to_string(),
    ))
}

fn map_orchestrator_error(e: OrchestratorError) -> (StatusCode, String) {
    // The raw response travels with the parse failure for diagnosis; keep it
    // in the body instead of flattening to the display message
    if let OrchestratorError::ParseFailure { detail, raw } = &e {
        tracing::warn!(%detail, raw = %raw, "generator response rejected at parse");
        let body = serde_json::json!({
            "error": "generator response could not be parsed",
            "detail": detail,
            "raw": raw,
        });
        return (StatusCode::BAD_GATEWAY, body.to_string());
    }

    let status = match &e {
        OrchestratorError::ParseFailure { .. } | OrchestratorError::GeneratorFailure(_) => {
            StatusCode::BAD_GATEWAY
        }
        OrchestratorError::NoViableCombo
        | OrchestratorError::NotCombatLike(_)
        | OrchestratorError::CommitFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        OrchestratorError::ProposalInFlight
        | OrchestratorError::AlreadyResolved(_)
        | OrchestratorError::StaleProposal(_)
        | OrchestratorError::NoThemePending => StatusCode::CONFLICT,
        OrchestratorError::UnknownEncounter(_) | OrchestratorError::UnknownProposal(_) => {
            StatusCode::NOT_FOUND
        }
    };
    (status, e.to_string())
}
