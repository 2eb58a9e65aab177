use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::modules::registrations::handlers::register;

use super::handlers::list_workshops;

pub fn workshop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_workshops))
        .route("/{id}/register", post(register))
}
