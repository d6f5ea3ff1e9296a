//! Session routes: creation and committed-adventure snapshots

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Connection, EncounterNode, Proposal};
use crate::domain::value_objects::SessionId;
use crate::infrastructure::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Snapshot of the committed adventure state
#[derive(Debug, Serialize)]
pub struct AdventureSnapshot {
    pub id: String,
    pub title: String,
    pub nodes: Vec<EncounterNode>,
    pub connections: Vec<Connection>,
    pub proposals: Vec<Proposal>,
}

/// Create a new adventure session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let id = state.create_session(&req.title).await;
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: id.to_string(),
        }),
    )
}

/// Get the committed adventure structure for a session
pub async fn get_adventure(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AdventureSnapshot>, (StatusCode, String)> {
    let session_id = parse_session_id(&id)?;
    let session = state
        .session(session_id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Session not found".to_string()))?;
    let session = session.lock().await;

    let mut nodes: Vec<EncounterNode> = session.adventure.nodes().cloned().collect();
    nodes.sort_by(|a, b| a.title.cmp(&b.title));

    Ok(Json(AdventureSnapshot {
        id: session.adventure.id.to_string(),
        title: session.adventure.title.clone(),
        nodes,
        connections: session.adventure.connections().to_vec(),
        proposals: session.proposals().to_vec(),
    }))
}

pub fn parse_session_id(raw: &str) -> Result<SessionId, (StatusCode, String)> {
    Uuid::parse_str(raw)
        .map(SessionId::from_uuid)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid session ID".to_string()))
}
