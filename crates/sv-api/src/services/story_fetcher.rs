//! Upstream story fetcher.
//!
//! A single bounded-timeout GET against the story service. No retries: a
//! failed fetch fails the whole request.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use sv_models::Story;

use crate::error::{ApiError, ApiResult};

/// Client for the upstream story service.
pub struct StoryFetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl StoryFetcher {
    /// Create a new fetcher sharing the process-wide HTTP client.
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            timeout,
        }
    }

    /// Fetch a story document by ID.
    pub async fn fetch(&self, story_id: &str) -> ApiResult<Story> {
        let url = format!("{}/api/stories/{}", self.base_url, story_id);
        debug!(story_id = %story_id, "Fetching story from upstream");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(story_id = %story_id, "Upstream story fetch failed: {}", e);
                if e.is_timeout() {
                    ApiError::upstream(format!(
                        "Request timed out after {}ms",
                        self.timeout.as_millis()
                    ))
                } else {
                    ApiError::upstream(format!("Failed to fetch story: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(story_id = %story_id, status = %status, "Upstream returned non-OK status");
            return Err(ApiError::upstream(format!(
                "Failed to fetch story: {}",
                status
            )));
        }

        response
            .json::<Story>()
            .await
            .map_err(|e| ApiError::upstream(format!("Failed to decode story: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_parses_story() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stories/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Test",
                "content": {"pages": [{"pageNumber": 1, "text": "Hello"}]}
            })))
            .mount(&server)
            .await;

        let fetcher = StoryFetcher::new(
            reqwest::Client::new(),
            server.uri(),
            Duration::from_secs(5),
        );

        let story = fetcher.fetch("abc123").await.unwrap();
        assert_eq!(story.title_or_default(), "Test");
        assert_eq!(story.pages().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_non_ok_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stories/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = StoryFetcher::new(
            reqwest::Client::new(),
            server.uri(),
            Duration::from_secs(5),
        );

        let err = fetcher.fetch("missing").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stories/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(serde_json::json!({"title": "Slow"})),
            )
            .mount(&server)
            .await;

        let fetcher = StoryFetcher::new(
            reqwest::Client::new(),
            server.uri(),
            Duration::from_millis(100),
        );

        let err = fetcher.fetch("slow").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
