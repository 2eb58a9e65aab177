use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::models::{
    NewSchool, NewWorkshop, RegistrationFilter, UpdateWorkshop, WorkshopSummary,
};
use crate::error::{AppError, AppResult};

use super::export::to_csv;

/// Aggregate counters for the admin landing page.
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Response> {
    let total_registrations = state.registrations.count_all().await?;
    let breakdown = state.registrations.status_breakdown().await?;
    let active_workshops = state.workshops.count_active().await?;
    let revenue = state.payments.completed_revenue().await?;

    let mut workshops = Vec::new();
    for workshop in state.workshops.list_active().await? {
        let confirmed = state.workshops.confirmed_count(workshop.id).await?;
        workshops.push(WorkshopSummary::new(workshop, confirmed));
    }

    Ok(Json(json!({
        "total_registrations": total_registrations,
        "active_workshops": active_workshops,
        "completed_revenue": revenue,
        "by_status": breakdown,
        "workshops": workshops,
    }))
    .into_response())
}

pub async fn list_registrations(
    State(state): State<AppState>,
    Query(filter): Query<RegistrationFilter>,
) -> AppResult<Response> {
    let registrations = state.registrations.list(&filter).await?;
    Ok(Json(registrations).into_response())
}

pub async fn export_registrations(
    State(state): State<AppState>,
    Query(filter): Query<RegistrationFilter>,
) -> AppResult<Response> {
    let rows = state.registrations.export_rows(&filter).await?;
    let csv = to_csv(&rows);
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"registrations.csv\"".to_string(),
        ),
    ];
    Ok((headers, csv).into_response())
}

#[derive(Debug, Deserialize)]
pub struct MarkCompletedRequest {
    pub ids: Vec<Uuid>,
}

/// Bulk override marking registrations completed without a verified
/// payment. Operator action, so it is always logged with the affected ids.
pub async fn mark_completed(
    State(state): State<AppState>,
    Json(request): Json<MarkCompletedRequest>,
) -> AppResult<Response> {
    if request.ids.is_empty() {
        return Err(AppError::Validation("No registration ids given".to_string()));
    }
    let updated = state.registrations.mark_completed_bulk(&request.ids).await?;
    info!(
        ids = ?request.ids,
        requested = request.ids.len(),
        updated,
        "registrations marked completed by operator"
    );
    Ok(Json(json!({ "updated": updated })).into_response())
}

pub async fn create_workshop(
    State(state): State<AppState>,
    Json(new): Json<NewWorkshop>,
) -> AppResult<Response> {
    new.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if new.fee.is_sign_negative() {
        return Err(AppError::Validation("Fee must not be negative".to_string()));
    }
    let workshop = state.workshops.create(&new).await?;
    Ok((StatusCode::CREATED, Json(workshop)).into_response())
}

pub async fn update_workshop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateWorkshop>,
) -> AppResult<Response> {
    update
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if update.fee.is_some_and(|fee| fee.is_sign_negative()) {
        return Err(AppError::Validation("Fee must not be negative".to_string()));
    }
    let workshop = state.workshops.update(id, &update).await?;
    Ok(Json(workshop).into_response())
}

pub async fn create_school(
    State(state): State<AppState>,
    Json(new): Json<NewSchool>,
) -> AppResult<Response> {
    new.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let school = state.schools.create(&new).await?;
    Ok((StatusCode::CREATED, Json(school)).into_response())
}
