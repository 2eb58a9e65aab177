use axum::{extract::State, Json};

use crate::app_state::AppState;
use crate::db::models::School;
use crate::error::AppResult;

/// Schools offered in the registration form's dropdown.
pub async fn list_schools(State(state): State<AppState>) -> AppResult<Json<Vec<School>>> {
    let schools = state.schools.list_active().await?;
    Ok(Json(schools))
}
