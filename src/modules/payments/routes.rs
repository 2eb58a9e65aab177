use axum::{routing::post, Router};

use crate::app_state::AppState;

use super::handlers::{cancel_callback, fail_callback, initiate_payment, success_callback};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/{registration_id}/initiate", post(initiate_payment))
        .route("/callback/success", post(success_callback))
        .route("/callback/fail", post(fail_callback))
        .route("/callback/cancel", post(cancel_callback))
}
