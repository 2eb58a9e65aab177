use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Wraps every request in a span carrying the method, the matched route
/// and a fresh request id, and logs status and latency on the way out.
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let request_id = Uuid::now_v7();

    let span = info_span!(
        "http_request",
        %method,
        %route,
        %request_id,
    );

    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    let latency = start.elapsed();

    let _enter = span.enter();
    info!(
        status = response.status().as_u16(),
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}
