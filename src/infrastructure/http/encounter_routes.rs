//! Encounter balancing routes: candidate filtering and combo generation

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::application::services::{ComboGenerator, ComboOption, MonsterFilter};
use crate::domain::entities::{EncounterType, MonsterCatalog, MonsterMetadata};
use crate::domain::value_objects::{xp_budget, DifficultyTier, PartyProfile, XpWindow};
use crate::infrastructure::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EncounterRequest {
    pub level: u8,
    pub size: u8,
    pub tier: DifficultyTier,
    pub encounter_type: EncounterType,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub budget: u32,
    pub candidates: Vec<MonsterMetadata>,
    /// True when the pool was too large and theme keywords should be
    /// gathered before proceeding
    pub needs_keywords: bool,
}

#[derive(Debug, Serialize)]
pub struct CombosResponse {
    pub budget: u32,
    pub window: XpWindow,
    pub combos: Vec<ComboOption>,
}

fn catalog(state: &AppState) -> Result<&MonsterCatalog, (StatusCode, String)> {
    state.catalog.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "Monster catalog is unavailable".to_string(),
    ))
}

/// Filter the catalog down to budget-appropriate candidates
pub async fn filter_candidates(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EncounterRequest>,
) -> Result<Json<FilterResponse>, (StatusCode, String)> {
    let catalog = catalog(&state)?;
    let party = PartyProfile::new(req.level, req.size).clamped();
    let budget = xp_budget(party, req.tier);

    let outcome = MonsterFilter::new().filter(
        catalog,
        budget,
        party,
        req.encounter_type,
        req.keywords.as_deref(),
    );

    Ok(Json(FilterResponse {
        budget,
        candidates: outcome.candidates,
        needs_keywords: outcome.needs_keywords,
    }))
}

/// Generate balanced creature combinations for a party
pub async fn generate_combos(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EncounterRequest>,
) -> Result<Json<CombosResponse>, (StatusCode, String)> {
    let catalog = catalog(&state)?;
    let party = PartyProfile::new(req.level, req.size).clamped();
    let budget = xp_budget(party, req.tier);
    let window = XpWindow::around(budget);

    let outcome = MonsterFilter::new().filter(
        catalog,
        budget,
        party,
        req.encounter_type,
        req.keywords.as_deref(),
    );
    let combos = ComboGenerator::new().generate(&outcome.candidates, budget, party, window);

    Ok(Json(CombosResponse {
        budget,
        window,
        combos,
    }))
}
