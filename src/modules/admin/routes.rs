use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::app_state::AppState;

use super::handlers::{
    create_school, create_workshop, dashboard, export_registrations, list_registrations,
    mark_completed, update_workshop,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/registrations", get(list_registrations))
        .route("/registrations/export", get(export_registrations))
        .route("/registrations/mark-completed", post(mark_completed))
        .route("/workshops", post(create_workshop))
        .route("/workshops/{id}", patch(update_workshop))
        .route("/schools", post(create_school))
}
