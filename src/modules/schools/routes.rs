use axum::{routing::get, Router};

use crate::app_state::AppState;

use super::handlers::list_schools;

pub fn school_routes() -> Router<AppState> {
    Router::new().route("/", get(list_schools))
}
