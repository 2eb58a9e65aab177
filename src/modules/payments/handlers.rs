use axum::{
    extract::{Path, State},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppResult;

use super::service::CallbackOutcome;

pub async fn initiate_payment(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let session = state.lifecycle.initiate(registration_id).await?;
    Ok(Json(json!({
        "redirect_url": session.redirect_url,
        "transaction_id": session.transaction_id,
    })))
}

/// Fields SSLCommerz posts back on a successful checkout. Everything else
/// in the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct SuccessCallback {
    pub tran_id: String,
    pub val_id: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub value_a: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveCallback {
    pub tran_id: String,
    #[serde(default)]
    pub value_a: Option<String>,
}

// The gateway drives these endpoints. They always answer 200; an error
// status would only make the provider retry a callback we have already
// dealt with.

pub async fn success_callback(
    State(state): State<AppState>,
    Form(callback): Form<SuccessCallback>,
) -> Json<Value> {
    // The posted amount and passthrough are logged for forensics only; the
    // lifecycle trusts the gateway's validation response, not this form.
    info!(
        tran_id = %callback.tran_id,
        posted_amount = callback.amount.as_deref().unwrap_or("-"),
        registration_number = callback.value_a.as_deref().unwrap_or("-"),
        "success callback received"
    );

    let outcome = match state
        .lifecycle
        .handle_success(&callback.tran_id, &callback.val_id)
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(tran_id = %callback.tran_id, error = %err, "success callback errored");
            return Json(json!({
                "status": "pending",
                "message": "Payment is being verified. Please check back shortly.",
            }));
        }
    };
    Json(outcome_body(outcome))
}

pub async fn fail_callback(
    State(state): State<AppState>,
    Form(callback): Form<ResolveCallback>,
) -> Json<Value> {
    info!(
        tran_id = %callback.tran_id,
        registration_number = callback.value_a.as_deref().unwrap_or("-"),
        "fail callback received"
    );
    let outcome = match state.lifecycle.handle_fail(&callback.tran_id).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(tran_id = %callback.tran_id, error = %err, "fail callback errored");
            return Json(json!({ "status": "error", "message": "Callback could not be processed." }));
        }
    };
    Json(outcome_body(outcome))
}

pub async fn cancel_callback(
    State(state): State<AppState>,
    Form(callback): Form<ResolveCallback>,
) -> Json<Value> {
    info!(
        tran_id = %callback.tran_id,
        registration_number = callback.value_a.as_deref().unwrap_or("-"),
        "cancel callback received"
    );
    let outcome = match state.lifecycle.handle_cancel(&callback.tran_id).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(tran_id = %callback.tran_id, error = %err, "cancel callback errored");
            return Json(json!({ "status": "error", "message": "Callback could not be processed." }));
        }
    };
    Json(outcome_body(outcome))
}

fn outcome_body(outcome: CallbackOutcome) -> Value {
    match outcome {
        CallbackOutcome::Completed | CallbackOutcome::AlreadyCompleted => json!({
            "status": "completed",
            "message": "Payment completed successfully.",
        }),
        CallbackOutcome::ValidationFailed | CallbackOutcome::AmountMismatch => json!({
            "status": "failed",
            "message": "Payment could not be verified.",
        }),
        CallbackOutcome::Failed => json!({
            "status": "failed",
            "message": "Payment failed.",
        }),
        CallbackOutcome::Cancelled => json!({
            "status": "cancelled",
            "message": "Payment was cancelled.",
        }),
        CallbackOutcome::PaymentNotFound => json!({
            "status": "unknown",
            "message": "No matching payment was found.",
        }),
    }
}
