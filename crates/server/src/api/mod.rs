//! REST API layer built on Axum.
//!
//! HTTP handlers for collection management and point mutation/retrieval,
//! plus middleware for body size limits, CORS, request ID tracing, and
//! metrics collection.

/// API error types mapped to HTTP status codes.
pub mod errors;
/// HTTP request handlers and application state.
pub mod handlers;
/// Prometheus metrics recording and background collection.
pub mod metrics;
/// Request and response data transfer objects.
pub mod models;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use handlers::AppState;
use pointsdb_core::config;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

async fn request_id_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("request", request_id = %request_id);
    async move {
        let mut response = next.run(req).await;
        response.headers_mut().insert(
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderValue::from_str(&request_id)
                .expect("UUID v4 is always valid ASCII for header values"),
        );
        response
    }
    .instrument(span)
    .await
}

async fn metrics_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    metrics::record_request(&method, &path, response.status().as_u16(), start.elapsed());
    response
}

/// Builds the Axum router with all routes and middleware layers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/collections",
            get(handlers::list_collections).post(handlers::create_collection),
        )
        .route(
            "/collections/{name}",
            axum::routing::delete(handlers::delete_collection),
        )
        .route(
            "/collections/{name}/points",
            put(handlers::upsert_points).post(handlers::retrieve_points),
        )
        .route(
            "/collections/{name}/points/vectors",
            put(handlers::update_vectors),
        )
        .route(
            "/collections/{name}/points/vectors/delete",
            post(handlers::delete_vectors),
        )
        .route(
            "/collections/{name}/points/delete",
            post(handlers::delete_points),
        )
        .route(
            "/collections/{name}/points/payload",
            post(handlers::set_payload).put(handlers::overwrite_payload),
        )
        .route(
            "/collections/{name}/points/payload/delete",
            post(handlers::delete_payload),
        )
        .route(
            "/collections/{name}/points/payload/clear",
            post(handlers::clear_payload),
        )
        .route(
            "/collections/{name}/points/batch",
            post(handlers::batch_update),
        )
        .route("/collections/{name}/points/{id}", get(handlers::get_point))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(config::MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}
