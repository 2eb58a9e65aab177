use axum::{routing::get, Router};

use crate::app_state::AppState;

use super::handlers::{download_receipt, get_registration};

pub fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_registration))
        .route("/{id}/receipt", get(download_receipt))
}
