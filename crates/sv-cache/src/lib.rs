//! Redis story cache.
//!
//! This crate provides the cache-aside layer for story reads:
//! - `story:{id}` keys holding the story JSON with a fixed TTL
//! - Hit/miss counters exported through the process metrics recorder
//! - Always-miss degradation when Redis is unreachable at startup

pub mod cache;
pub mod error;

pub use cache::{CacheConfig, StoryCache};
pub use error::{CacheError, CacheResult};
