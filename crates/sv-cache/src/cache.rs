//! Cache-aside story cache backed by Redis.

use std::time::Duration;

use metrics::counter;
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use sv_models::Story;

use crate::error::{CacheError, CacheResult};

/// Metric names emitted by the cache.
pub mod names {
    pub const CACHE_HITS_TOTAL: &str = "storyverse_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "storyverse_cache_misses_total";
    pub const CACHE_ERRORS_TOTAL: &str = "storyverse_cache_errors_total";
}

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL
    pub redis_url: String,
    /// Entry time-to-live
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            ttl: Duration::from_secs(
                std::env::var("STORY_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
        }
    }
}

/// Story cache client.
///
/// A `None` client means the cache is disabled: every read is a miss and
/// writes are dropped. Runtime Redis errors also degrade to misses rather
/// than failing the read path.
pub struct StoryCache {
    client: Option<redis::Client>,
    ttl: Duration,
}

impl StoryCache {
    /// Connect to Redis, degrading to a disabled cache when unreachable.
    pub async fn connect(config: CacheConfig) -> Self {
        let client = match redis::Client::open(config.redis_url.as_str()) {
            Ok(client) => client,
            Err(e) => {
                warn!("Invalid Redis URL, running without cache: {}", e);
                return Self::disabled();
            }
        };

        // Probe the connection so a dead backend is detected at startup.
        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let pong: Result<String, redis::RedisError> =
                    redis::cmd("PING").query_async(&mut conn).await;
                match pong {
                    Ok(_) => {
                        info!("Connected to Redis story cache");
                        Self {
                            client: Some(client),
                            ttl: config.ttl,
                        }
                    }
                    Err(e) => {
                        warn!("Redis ping failed, running without cache: {}", e);
                        Self::disabled()
                    }
                }
            }
            Err(e) => {
                warn!("Redis connection failed, running without cache: {}", e);
                Self::disabled()
            }
        }
    }

    /// A cache that never hits. Used when Redis is unavailable and in tests.
    pub fn disabled() -> Self {
        Self {
            client: None,
            ttl: Duration::from_secs(3600),
        }
    }

    /// Whether a Redis backend is attached.
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    fn key(story_id: &str) -> String {
        format!("story:{}", story_id)
    }

    /// Look up a cached story. Errors degrade to a miss.
    pub async fn get(&self, story_id: &str) -> Option<Story> {
        let client = self.client.as_ref()?;

        let lookup = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let raw: Option<String> = conn.get(Self::key(story_id)).await?;
            Ok::<_, CacheError>(raw)
        };

        match lookup.await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(story) => {
                    counter!(names::CACHE_HITS_TOTAL).increment(1);
                    debug!(story_id = %story_id, "Story cache hit");
                    Some(story)
                }
                Err(e) => {
                    warn!(story_id = %story_id, "Discarding undecodable cache entry: {}", e);
                    counter!(names::CACHE_ERRORS_TOTAL).increment(1);
                    None
                }
            },
            Ok(None) => {
                counter!(names::CACHE_MISSES_TOTAL).increment(1);
                None
            }
            Err(e) => {
                warn!(story_id = %story_id, "Cache read failed, treating as miss: {}", e);
                counter!(names::CACHE_ERRORS_TOTAL).increment(1);
                counter!(names::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store a story with the configured TTL. Errors are logged and dropped.
    pub async fn put(&self, story_id: &str, story: &Story) {
        let Some(client) = self.client.as_ref() else {
            return;
        };

        let write = async {
            let raw = serde_json::to_string(story)?;
            let mut conn = client.get_multiplexed_async_connection().await?;
            conn.set_ex::<_, _, ()>(Self::key(story_id), raw, self.ttl.as_secs())
                .await?;
            Ok::<_, CacheError>(())
        };

        if let Err(e) = write.await {
            warn!(story_id = %story_id, "Cache write failed: {}", e);
            counter!(names::CACHE_ERRORS_TOTAL).increment(1);
        }
    }

    /// Probe the backend. Returns `Ok(false)` when the cache is disabled.
    pub async fn ping(&self) -> CacheResult<bool> {
        let Some(client) = self.client.as_ref() else {
            return Ok(false);
        };

        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(true)
    }

    /// Remove a cached story.
    pub async fn invalidate(&self, story_id: &str) -> CacheResult<()> {
        let Some(client) = self.client.as_ref() else {
            return Ok(());
        };

        let mut conn = client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(Self::key(story_id)).await?;
        debug!(story_id = %story_id, "Invalidated cached story");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespace() {
        assert_eq!(StoryCache::key("abc123"), "story:abc123");
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = StoryCache::disabled();
        assert!(!cache.is_enabled());

        let story = Story {
            title: Some("Test".to_string()),
            ..Default::default()
        };

        cache.put("abc", &story).await;
        assert!(cache.get("abc").await.is_none());
        cache.invalidate("abc").await.unwrap();
    }
}
