use axum::{extract::State, middleware, routing::get, Json, Router};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::{
    app_state::AppState,
    middleware::tracing::request_tracing,
    modules::{
        admin::routes::admin_routes, payments::routes::payment_routes,
        registrations::routes::registration_routes, schools::routes::school_routes,
        workshops::routes::workshop_routes,
    },
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/workshops", workshop_routes())
        .nest("/schools", school_routes())
        .nest("/registrations", registration_routes())
        .nest("/payments", payment_routes())
        .nest("/admin", admin_routes())
        .layer(middleware::from_fn(request_tracing))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::info!("Database health check failed: {}", e);
            "unhealthy"
        }
    };

    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
        }
    }))
}
