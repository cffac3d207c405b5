//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "storyverse_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "storyverse_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "storyverse_http_requests_in_flight";

    // Delivery metrics
    pub const CONTENT_DELIVERY_TOTAL: &str = "storyverse_content_delivery_total";

    // Media metrics
    pub const MEDIA_UPLOADS_TOTAL: &str = "storyverse_media_uploads_total";
    pub const MEDIA_DOWNLOADS_TOTAL: &str = "storyverse_media_downloads_total";
    pub const PROCESSING_ERRORS_TOTAL: &str = "storyverse_media_processing_errors_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "storyverse_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a content delivery (export) outcome.
pub fn record_delivery(format: &str, success: bool) {
    let labels = [
        ("format", format.to_string()),
        (
            "status",
            if success { "success" } else { "error" }.to_string(),
        ),
    ];
    counter!(names::CONTENT_DELIVERY_TOTAL, &labels).increment(1);
}

/// Record a media upload.
pub fn record_media_upload(media_type: &str) {
    let labels = [("media_type", media_type.to_string())];
    counter!(names::MEDIA_UPLOADS_TOTAL, &labels).increment(1);
}

/// Record a media download (signed URL issuance).
pub fn record_media_download(media_type: &str) {
    let labels = [("media_type", media_type.to_string())];
    counter!(names::MEDIA_DOWNLOADS_TOTAL, &labels).increment(1);
}

/// Record a media processing error.
pub fn record_processing_error(error_type: &str) {
    let labels = [("error_type", error_type.to_string())];
    counter!(names::PROCESSING_ERRORS_TOTAL, &labels).increment(1);
}

/// Record a rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (replace IDs and object keys).
fn sanitize_path(path: &str) -> String {
    // Media routes embed full object keys
    let path = regex_lite::Regex::new(r"/media/.+$")
        .unwrap()
        .replace(path, "/media/:key");
    // Story IDs (alphanumeric segment after /story/ or /invalidate/)
    let path = regex_lite::Regex::new(r"/story/[A-Za-z0-9_-]+")
        .unwrap()
        .replace(&path, "/story/:story_id");
    let path = regex_lite::Regex::new(r"/invalidate/[A-Za-z0-9_-]+")
        .unwrap()
        .replace(&path, "/invalidate/:story_id");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/story/abc123/pdf"),
            "/api/story/:story_id/pdf"
        );
        assert_eq!(
            sanitize_path("/api/cache/invalidate/abc123"),
            "/api/cache/invalidate/:story_id"
        );
        assert_eq!(
            sanitize_path("/api/media/stories/abc/images/page_1.jpg"),
            "/api/media/:key"
        );
        assert_eq!(sanitize_path("/health"), "/health");
    }
}
