//! Axum HTTP API server.
//!
//! This crate provides:
//! - Cache-aside story reads with upstream fetch
//! - PDF / ZIP package / HTML export endpoints
//! - Media upload, signing, listing and deletion
//! - Prometheus metrics and request middleware

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::StoryFetcher;
pub use state::AppState;
