use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::RegistrationForm;
use crate::error::AppResult;

pub async fn register(
    State(state): State<AppState>,
    Path(workshop_id): Path<Uuid>,
    Json(form): Json<RegistrationForm>,
) -> AppResult<Response> {
    let registration = state.ledger.submit(workshop_id, &form).await?;
    Ok((StatusCode::CREATED, Json(registration)).into_response())
}

pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let registration = state.ledger.get(id).await?;
    Ok(Json(registration).into_response())
}

pub async fn download_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let receipt = state.ledger.receipt(id).await?;
    let headers = [
        (header::CONTENT_TYPE, receipt.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", receipt.filename),
        ),
    ];
    Ok((headers, receipt.bytes).into_response())
}
