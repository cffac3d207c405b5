//! Media catalogue handlers: signed URL issuance, deletion, listing.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use sv_models::{MediaItem, MediaType};

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_media_download;
use crate::security::{is_valid_object_key, is_valid_story_id};
use crate::state::AppState;

/// Signed URL response.
#[derive(Serialize)]
pub struct MediaUrlResponse {
    pub url: String,
    pub key: String,
}

/// Deletion response.
#[derive(Serialize)]
pub struct MediaDeleteResponse {
    pub message: String,
    pub key: String,
}

/// Story media listing response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMediaResponse {
    pub story_id: String,
    pub media_items: Vec<MediaItem>,
}

/// Query parameters for the story media listing.
#[derive(Deserialize)]
pub struct MediaListQuery {
    /// Optional filter: `images` or `audio`.
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

/// Issue a fresh signed URL for a stored object.
///
/// GET /api/media/{key}
pub async fn get_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<MediaUrlResponse>> {
    if !is_valid_object_key(&key) {
        return Err(ApiError::bad_request("Invalid media key"));
    }

    let url = state
        .storage
        .presign_get(&key, state.config.signed_url_expiry)
        .await?;

    record_media_download(MediaType::from_key(&key).as_str());

    Ok(Json(MediaUrlResponse { url, key }))
}

/// Delete a stored object.
///
/// DELETE /api/media/{key}
pub async fn delete_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<MediaDeleteResponse>> {
    if !is_valid_object_key(&key) {
        return Err(ApiError::bad_request("Invalid media key"));
    }

    state.storage.delete_object(&key).await?;
    info!(key = %key, "Deleted media object");

    Ok(Json(MediaDeleteResponse {
        message: "Media deleted successfully".to_string(),
        key,
    }))
}

/// List a story's media with fresh signed URLs.
///
/// GET /api/story/{story_id}/media?type=images|audio
pub async fn list_story_media(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Query(query): Query<MediaListQuery>,
) -> ApiResult<Json<StoryMediaResponse>> {
    if !is_valid_story_id(&story_id) {
        return Err(ApiError::bad_request("Invalid story ID format"));
    }

    let mut prefix = format!("stories/{}/", story_id);
    match query.media_type.as_deref() {
        Some("images") => prefix.push_str("images/"),
        Some("audio") => prefix.push_str("audio/"),
        Some(other) => {
            return Err(ApiError::bad_request(format!(
                "Unknown media type filter: {}",
                other
            )))
        }
        None => {}
    }

    let objects = state.storage.list_objects(&prefix).await?;

    // Signed URLs are derived per listing, never persisted.
    let mut media_items = Vec::with_capacity(objects.len());
    for obj in objects {
        let url = state
            .storage
            .presign_get(&obj.key, state.config.signed_url_expiry)
            .await?;
        media_items.push(MediaItem {
            key: obj.key,
            size: obj.size,
            last_modified: obj.last_modified,
            url,
        });
    }

    Ok(Json(StoryMediaResponse {
        story_id,
        media_items,
    }))
}
