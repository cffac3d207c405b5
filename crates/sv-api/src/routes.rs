//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::export::{export_html, export_package, export_pdf};
use crate::handlers::media::{delete_media, get_media, list_story_media};
use crate::handlers::story::{get_story, invalidate_cache};
use crate::handlers::upload::{upload_audio, upload_base64, upload_image};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Story read + export routes
    let story_routes = Router::new()
        .route("/story/:story_id", get(get_story))
        .route("/story/:story_id/pdf", post(export_pdf))
        .route("/story/:story_id/package", post(export_package))
        .route("/story/:story_id/html", post(export_html))
        .route("/story/:story_id/media", get(list_story_media))
        .route("/cache/invalidate/:story_id", post(invalidate_cache));

    // Media upload routes
    let upload_routes = Router::new()
        .route("/upload/image", post(upload_image))
        .route("/upload/audio", post(upload_audio))
        .route("/upload/base64", post(upload_base64));

    // Signed URL and deletion routes (keys contain slashes)
    let media_routes = Router::new().route("/media/*key", get(get_media).delete(delete_media));

    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(story_routes)
        .merge(upload_routes)
        .merge(media_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
