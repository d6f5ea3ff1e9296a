//! HTTP REST API routes

mod budget_routes;
mod encounter_routes;
mod proposal_routes;
mod session_routes;
mod structure_routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::infrastructure::state::AppState;

pub use budget_routes::*;
pub use encounter_routes::*;
pub use proposal_routes::*;
pub use session_routes::*;
pub use structure_routes::*;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Deterministic engine routes
        .route("/api/budget", post(budget_routes::calculate_budget))
        .route(
            "/api/encounters/filter",
            post(encounter_routes::filter_candidates),
        )
        .route(
            "/api/encounters/combos",
            post(encounter_routes::generate_combos),
        )
        .route(
            "/api/structure/validate",
            post(structure_routes::validate_structure),
        )
        // Session routes
        .route("/api/sessions", post(session_routes::create_session))
        .route(
            "/api/sessions/{id}/adventure",
            get(session_routes::get_adventure),
        )
        // Proposal lifecycle
        .route(
            "/api/sessions/{id}/proposals",
            post(proposal_routes::start_proposal),
        )
        .route(
            "/api/sessions/{id}/proposals/confirm-keywords",
            post(proposal_routes::confirm_keywords),
        )
        .route(
            "/api/proposals/{id}/accept",
            post(proposal_routes::accept_proposal),
        )
        .route(
            "/api/proposals/{id}/reject",
            post(proposal_routes::reject_proposal),
        )
}
