use axum::{extract::State, Json};

use crate::app_state::AppState;
use crate::db::models::WorkshopSummary;
use crate::error::AppResult;

/// Public workshop listing with live occupancy figures.
pub async fn list_workshops(State(state): State<AppState>) -> AppResult<Json<Vec<WorkshopSummary>>> {
    let workshops = state.workshops.list_active().await?;
    let mut summaries = Vec::with_capacity(workshops.len());
    for workshop in workshops {
        let confirmed = state.workshops.confirmed_count(workshop.id).await?;
        summaries.push(WorkshopSummary::new(workshop, confirmed));
    }
    Ok(Json(summaries))
}
