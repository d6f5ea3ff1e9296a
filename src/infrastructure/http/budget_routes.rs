//! Budget calculation routes

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{xp_budget, DifficultyTier, PartyProfile, XpWindow};

#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub level: u8,
    pub size: u8,
    pub tier: DifficultyTier,
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub budget: u32,
    pub window: XpWindow,
    /// Party values after clamping to the supported ranges
    pub level: u8,
    pub size: u8,
}

/// Compute the XP budget and acceptance window for a party
pub async fn calculate_budget(Json(req): Json<BudgetRequest>) -> Json<BudgetResponse> {
    let party = PartyProfile::new(req.level, req.size).clamped();
    let budget = xp_budget(party, req.tier);

    Json(BudgetResponse {
        budget,
        window: XpWindow::around(budget),
        level: party.level,
        size: party.size,
    })
}
