//! Structure validation routes

use axum::Json;
use serde::Deserialize;

use crate::application::services::{StructureHint, StructureValidator, ValidationResult};
use crate::domain::entities::{Connection, EncounterNode};

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub nodes: Vec<EncounterNode>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub hint: StructureHint,
}

/// Validate a candidate adventure graph
pub async fn validate_structure(Json(req): Json<ValidateRequest>) -> Json<ValidationResult> {
    let result = StructureValidator::new().validate(&req.nodes, &req.connections, req.hint);
    Json(result)
}
