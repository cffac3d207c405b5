//! Export handlers: PDF, ZIP package, and HTML.
//!
//! Each export runs the same linear sequence: fetch story, render or
//! package, upload to the object store, respond with a presigned URL and
//! the object key. Scratch files live in `tempfile` guards, so partial
//! artifacts are removed whichever way the request ends.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tempfile::TempDir;
use tracing::info;

use sv_models::AssetFailure;
use sv_render::{build_package, render_html, render_pdf};
use sv_storage::export_key;

use crate::error::{ApiError, ApiResult};
use crate::handlers::story::fetch_fresh;
use crate::metrics::record_delivery;
use crate::security::is_valid_story_id;
use crate::state::AppState;

/// Response for PDF and HTML exports.
#[derive(Serialize)]
pub struct ExportResponse {
    pub url: String,
    pub key: String,
}

/// Response for package exports: the archive reference plus the
/// best-effort asset outcome.
#[derive(Serialize)]
pub struct PackageExportResponse {
    pub url: String,
    pub key: String,
    pub bundled: Vec<String>,
    pub failed: Vec<AssetFailure>,
}

/// Generate a PDF export.
///
/// POST /api/story/{story_id}/pdf
pub async fn export_pdf(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> ApiResult<Json<ExportResponse>> {
    let result = generate_pdf(&state, &story_id).await;
    record_delivery("pdf", result.is_ok());
    result.map(Json)
}

async fn generate_pdf(state: &AppState, story_id: &str) -> ApiResult<ExportResponse> {
    if !is_valid_story_id(story_id) {
        return Err(ApiError::bad_request("Invalid story ID format"));
    }

    let story = fetch_fresh(state, story_id).await?;

    let scratch = TempDir::new().map_err(|e| ApiError::internal(e.to_string()))?;
    let file_name = format!("{}_{}.pdf", story_id, Utc::now().timestamp_millis());
    let pdf_path = scratch.path().join(&file_name);

    render_pdf(&story, &pdf_path).await?;

    let key = export_key(story_id, &file_name);
    state
        .storage
        .upload_file(&pdf_path, &key, "application/pdf")
        .await?;

    let url = state
        .storage
        .presign_get(&key, state.config.signed_url_expiry)
        .await?;

    info!(story_id = %story_id, key = %key, "Generated PDF export");
    Ok(ExportResponse { url, key })
}

/// Generate a ZIP package export with all story assets.
///
/// POST /api/story/{story_id}/package
pub async fn export_package(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> ApiResult<Json<PackageExportResponse>> {
    let result = generate_package(&state, &story_id).await;
    record_delivery("package", result.is_ok());
    result.map(Json)
}

async fn generate_package(state: &AppState, story_id: &str) -> ApiResult<PackageExportResponse> {
    if !is_valid_story_id(story_id) {
        return Err(ApiError::bad_request("Invalid story ID format"));
    }

    let story = fetch_fresh(state, story_id).await?;

    let (archive, outcome) = build_package(&story, &state.http, &state.storage).await?;

    let file_name = format!("{}_{}.zip", story_id, Utc::now().timestamp_millis());
    let key = export_key(story_id, &file_name);
    state
        .storage
        .upload_file(archive.zip_path(), &key, "application/zip")
        .await?;

    let url = state
        .storage
        .presign_get(&key, state.config.signed_url_expiry)
        .await?;

    info!(
        story_id = %story_id,
        key = %key,
        bundled = outcome.bundled.len(),
        failed = outcome.failed.len(),
        "Generated package export"
    );

    Ok(PackageExportResponse {
        url,
        key,
        bundled: outcome.bundled,
        failed: outcome.failed,
    })
}

/// Generate an HTML export.
///
/// POST /api/story/{story_id}/html
pub async fn export_html(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> ApiResult<Json<ExportResponse>> {
    let result = generate_html(&state, &story_id).await;
    record_delivery("html", result.is_ok());
    result.map(Json)
}

async fn generate_html(state: &AppState, story_id: &str) -> ApiResult<ExportResponse> {
    if !is_valid_story_id(story_id) {
        return Err(ApiError::bad_request("Invalid story ID format"));
    }

    let story = fetch_fresh(state, story_id).await?;
    let html = render_html(&story);

    let file_name = format!("{}_{}.html", story_id, Utc::now().timestamp_millis());
    let key = export_key(story_id, &file_name);
    state
        .storage
        .upload_bytes(html.into_bytes(), &key, "text/html")
        .await?;

    let url = state
        .storage
        .presign_get(&key, state.config.signed_url_expiry)
        .await?;

    info!(story_id = %story_id, key = %key, "Generated HTML export");
    Ok(ExportResponse { url, key })
}
