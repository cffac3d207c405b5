//! Story read and cache handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use sv_models::Story;

use crate::error::{ApiError, ApiResult};
use crate::security::is_valid_story_id;
use crate::state::AppState;

/// Cache invalidation response.
#[derive(Serialize)]
pub struct InvalidateResponse {
    pub status: String,
}

/// Get a story, cache-aside.
///
/// GET /api/story/{story_id}
///
/// Cache hit returns the cached document; a miss fetches from the upstream
/// story service and stores the result with the configured TTL.
pub async fn get_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> ApiResult<Json<Story>> {
    if !is_valid_story_id(&story_id) {
        return Err(ApiError::bad_request("Invalid story ID format"));
    }

    if let Some(story) = state.cache.get(&story_id).await {
        return Ok(Json(story));
    }

    let story = state.fetcher.fetch(&story_id).await?;
    state.cache.put(&story_id, &story).await;

    Ok(Json(story))
}

/// Drop the cached copy of a story.
///
/// POST /api/cache/invalidate/{story_id}
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> ApiResult<Json<InvalidateResponse>> {
    if !is_valid_story_id(&story_id) {
        return Err(ApiError::bad_request("Invalid story ID format"));
    }

    state.cache.invalidate(&story_id).await?;
    info!(story_id = %story_id, "Invalidated story cache entry");

    Ok(Json(InvalidateResponse {
        status: "success".to_string(),
    }))
}

/// Fetch a story from upstream and write it through to the cache.
///
/// Export endpoints always want a fresh document; writing it through keeps
/// the cached copy in step with what this service last observed.
pub(crate) async fn fetch_fresh(state: &AppState, story_id: &str) -> ApiResult<Story> {
    let story = state.fetcher.fetch(story_id).await?;
    state.cache.put(story_id, &story).await;
    Ok(story)
}
