//! Veridex API Gateway
//!
//! The HTTP surface over ingestion, retrieval, and answering:
//! - Document upload and corpus embedding
//! - Question answering with canned shortcuts and debug projection
//! - Health, readiness, and Prometheus metrics endpoints

pub mod handlers;
pub mod state;

pub use state::AppState;

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use veridex_common::metrics::RequestMetrics;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // The body limit leaves room for multipart framing; the per-file size
    // check against storage.max_upload_bytes happens in the handler.
    let upload_limit = DefaultBodyLimit::max(state.config.storage.max_upload_bytes + 1024 * 1024);

    Router::new()
        .route("/upload", post(handlers::upload::upload).layer(upload_limit))
        .route("/embed_new", post(handlers::ingest::embed_new))
        .route("/query", post(handlers::query::query))
        .route("/list_indexed", get(handlers::list::list_indexed))
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Record request count and latency per endpoint.
async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let tracker = RequestMetrics::start(&method, &endpoint);
    let response = next.run(request).await;
    tracker.finish(response.status().as_u16());
    response
}
