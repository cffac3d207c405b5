//! Media upload handlers.
//!
//! Images are resized and re-encoded before upload; audio is stored raw.
//! Intake accepts images, audio, and PDF only; anything else is rejected
//! before any object-store write.

use axum::extract::{Multipart, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use sv_render::{process_story_image, DEFAULT_JPEG_QUALITY};
use sv_storage::{audio_key, image_key};

use crate::error::{ApiError, ApiResult};
use crate::metrics::{record_media_upload, record_processing_error};
use crate::security::is_valid_story_id;
use crate::state::AppState;

/// Maximum upload size (10MB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Upload response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
    pub story_id: String,
    pub page_number: String,
}

/// Base64 upload request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Base64UploadRequest {
    pub image: Option<String>,
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub page_number: Option<String>,
}

/// One file plus its accompanying form fields.
struct UploadForm {
    data: Vec<u8>,
    content_type: String,
    file_name: Option<String>,
    story_id: String,
    page_number: String,
    quality: Option<u8>,
}

/// Upload a page image.
///
/// POST /api/upload/image (multipart: `image`, `storyId`, `pageNumber`, `quality`)
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let form = read_upload_form(multipart, "image").await?;

    if !form.content_type.starts_with("image/") {
        record_processing_error("unsupported_file_type");
        return Err(ApiError::unsupported_media_type(format!(
            "Unsupported file type: {}",
            form.content_type
        )));
    }

    let quality = form.quality.unwrap_or(DEFAULT_JPEG_QUALITY);
    let processed = process_story_image(form.data, quality).await.map_err(|e| {
        record_processing_error("processing_error");
        ApiError::from(e)
    })?;

    let key = image_key(
        &form.story_id,
        &form.page_number,
        &format!("{}.jpg", Uuid::new_v4()),
    );
    state
        .storage
        .upload_bytes(processed, &key, "image/jpeg")
        .await?;

    let url = state
        .storage
        .presign_get(&key, state.config.signed_url_expiry)
        .await?;

    record_media_upload("image");
    info!(key = %key, "Uploaded page image");

    Ok(Json(UploadResponse {
        url,
        key,
        story_id: form.story_id,
        page_number: form.page_number,
    }))
}

/// Upload an audio file, stored unmodified.
///
/// POST /api/upload/audio (multipart: `audio`, `storyId`, `pageNumber`)
pub async fn upload_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let form = read_upload_form(multipart, "audio").await?;

    if !is_accepted_media_type(&form.content_type) {
        record_processing_error("unsupported_file_type");
        return Err(ApiError::unsupported_media_type(format!(
            "Unsupported file type: {}",
            form.content_type
        )));
    }

    let ext = extension_for(&form.content_type, form.file_name.as_deref());
    let key = audio_key(
        &form.story_id,
        &form.page_number,
        &format!("{}{}", Uuid::new_v4(), ext),
    );
    let content_type = form.content_type.clone();
    state
        .storage
        .upload_bytes(form.data, &key, &content_type)
        .await?;

    let url = state
        .storage
        .presign_get(&key, state.config.signed_url_expiry)
        .await?;

    record_media_upload("audio");
    info!(key = %key, "Uploaded audio file");

    Ok(Json(UploadResponse {
        url,
        key,
        story_id: form.story_id,
        page_number: form.page_number,
    }))
}

/// Upload a base64-encoded image (data URL or bare base64).
///
/// POST /api/upload/base64
pub async fn upload_base64(
    State(state): State<AppState>,
    Json(body): Json<Base64UploadRequest>,
) -> ApiResult<Json<UploadResponse>> {
    let Some(image) = body.image.as_deref() else {
        record_processing_error("missing_data");
        return Err(ApiError::bad_request("No image data provided"));
    };

    let encoded = match image.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:image/") => rest,
        _ => image,
    };

    let data = BASE64
        .decode(encoded.trim())
        .map_err(|e| ApiError::bad_request(format!("Invalid base64 image data: {}", e)))?;

    if data.len() > MAX_UPLOAD_BYTES {
        record_processing_error("file_too_large");
        return Err(ApiError::bad_request("File too large"));
    }

    let story_id = validated_story_id(body.story_id)?;
    let page_number = validated_page_number(body.page_number)?;

    let processed = process_story_image(data, DEFAULT_JPEG_QUALITY)
        .await
        .map_err(|e| {
            record_processing_error("processing_error");
            ApiError::from(e)
        })?;

    let key = image_key(&story_id, &page_number, &format!("{}.jpg", Uuid::new_v4()));
    state
        .storage
        .upload_bytes(processed, &key, "image/jpeg")
        .await?;

    let url = state
        .storage
        .presign_get(&key, state.config.signed_url_expiry)
        .await?;

    record_media_upload("image");
    info!(key = %key, "Uploaded base64 image");

    Ok(Json(UploadResponse {
        url,
        key,
        story_id,
        page_number,
    }))
}

/// Read the multipart form: one file under `file_field` plus text fields.
async fn read_upload_form(mut multipart: Multipart, file_field: &str) -> ApiResult<UploadForm> {
    let mut data: Option<Vec<u8>> = None;
    let mut content_type = String::new();
    let mut file_name: Option<String> = None;
    let mut story_id: Option<String> = None;
    let mut page_number: Option<String> = None;
    let mut quality: Option<u8> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == file_field {
            content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

            if bytes.len() > MAX_UPLOAD_BYTES {
                record_processing_error("file_too_large");
                return Err(ApiError::bad_request("File too large"));
            }
            data = Some(bytes.to_vec());
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid form field: {}", e)))?;
            match name.as_str() {
                "storyId" => story_id = Some(value),
                "pageNumber" => page_number = Some(value),
                "quality" => quality = value.parse().ok(),
                _ => {}
            }
        }
    }

    let Some(data) = data else {
        record_processing_error("missing_file");
        return Err(ApiError::bad_request(format!(
            "No {} file provided",
            file_field
        )));
    };

    Ok(UploadForm {
        data,
        content_type,
        file_name,
        story_id: validated_story_id(story_id)?,
        page_number: validated_page_number(page_number)?,
        quality,
    })
}

fn validated_story_id(story_id: Option<String>) -> ApiResult<String> {
    match story_id {
        None => Ok("general".to_string()),
        Some(id) if is_valid_story_id(&id) => Ok(id),
        Some(_) => Err(ApiError::bad_request("Invalid story ID format")),
    }
}

fn validated_page_number(page_number: Option<String>) -> ApiResult<String> {
    match page_number {
        None => Ok("0".to_string()),
        Some(n) if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => Ok(n),
        Some(_) => Err(ApiError::bad_request("Invalid page number")),
    }
}

/// Accepted MIME classes at intake.
fn is_accepted_media_type(content_type: &str) -> bool {
    content_type.starts_with("image/")
        || content_type.starts_with("audio/")
        || content_type == "application/pdf"
}

/// Pick a file extension from the uploaded name, falling back to the
/// content type.
fn extension_for(content_type: &str, file_name: Option<&str>) -> String {
    if let Some(name) = file_name {
        if let Some((_, ext)) = name.rsplit_once('.') {
            if !ext.is_empty()
                && ext.len() <= 8
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return format!(".{}", ext.to_lowercase());
            }
        }
    }

    match content_type {
        "audio/mpeg" => ".mp3".to_string(),
        "audio/wav" | "audio/x-wav" => ".wav".to_string(),
        "audio/ogg" => ".ogg".to_string(),
        "application/pdf" => ".pdf".to_string(),
        _ => ".bin".to_string(),
    }
}
