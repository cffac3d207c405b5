//! Application state.
//!
//! Every client handle is constructed once at process start and shared by
//! reference, so request handlers never reach for globals and tests can
//! substitute fakes (a disabled cache, a wiremock upstream).

use std::sync::Arc;

use sv_cache::{CacheConfig, StoryCache};
use sv_storage::S3Client;

use crate::config::ApiConfig;
use crate::services::StoryFetcher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<S3Client>,
    pub cache: Arc<StoryCache>,
    pub fetcher: Arc<StoryFetcher>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Assemble state from explicitly constructed clients.
    pub fn new(
        config: ApiConfig,
        storage: S3Client,
        cache: StoryCache,
        http: reqwest::Client,
    ) -> Self {
        let fetcher = StoryFetcher::new(
            http.clone(),
            config.story_db_url.clone(),
            config.story_fetch_timeout,
        );

        Self {
            config,
            storage: Arc::new(storage),
            cache: Arc::new(cache),
            fetcher: Arc::new(fetcher),
            http,
        }
    }

    /// Create state from environment variables.
    pub async fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let storage = S3Client::from_env()?;
        let cache = StoryCache::connect(CacheConfig::from_env()).await;
        let http = reqwest::Client::new();

        Ok(Self::new(config, storage, cache, http))
    }
}
