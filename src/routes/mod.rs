pub mod generate;
pub mod health;
pub mod metrics;
pub mod status;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// All application routes, served at the root and again under `/api`.
pub fn router(state: AppState) -> Router {
    // Two files per request plus multipart framing
    let body_limit = state.config.max_upload_bytes.saturating_mul(2) + 1024 * 1024;

    let api = Router::new()
        .route("/generate", post(generate::generate))
        .route("/status/{job_id}", get(status::job_status))
        .route("/health", get(health::health_check))
        .route("/upload/image", post(upload::upload_image))
        .route("/upload/audio", post(upload::upload_audio))
        .route("/upload/multiple", post(upload::upload_multiple));

    Router::new()
        .route("/", get(health::service_info))
        .merge(api.clone())
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
}
