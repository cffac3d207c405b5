//! Page image processing.
//!
//! Uploaded images are constrained to fit 1200x800, preserving aspect ratio
//! and never upscaling, then re-encoded as JPEG at the requested quality.

use std::io::Cursor;

use image::imageops::FilterType;
use image::ImageOutputFormat;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// Maximum width of a processed page image.
pub const MAX_IMAGE_WIDTH: u32 = 1200;

/// Maximum height of a processed page image.
pub const MAX_IMAGE_HEIGHT: u32 = 800;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Resize and re-encode an uploaded image.
///
/// Decoding and encoding are CPU-bound, so the work runs on the blocking
/// thread pool.
pub async fn process_story_image(data: Vec<u8>, quality: u8) -> RenderResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || process_story_image_sync(&data, quality))
        .await
        .map_err(|e| RenderError::Task(e.to_string()))?
}

fn process_story_image_sync(data: &[u8], quality: u8) -> RenderResult<Vec<u8>> {
    let img = image::load_from_memory(data).map_err(|e| RenderError::Image(e.to_string()))?;

    let (width, height) = (img.width(), img.height());
    let img = if width > MAX_IMAGE_WIDTH || height > MAX_IMAGE_HEIGHT {
        debug!(
            "Resizing image from {}x{} to fit {}x{}",
            width, height, MAX_IMAGE_WIDTH, MAX_IMAGE_HEIGHT
        );
        img.resize(MAX_IMAGE_WIDTH, MAX_IMAGE_HEIGHT, FilterType::Lanczos3)
    } else {
        img
    };

    let mut out = Vec::new();
    img.write_to(
        &mut Cursor::new(&mut out),
        ImageOutputFormat::Jpeg(quality.clamp(1, 100)),
    )
    .map_err(|e| RenderError::Image(e.to_string()))?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 40, 200]),
        ));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_oversized_image_is_shrunk() {
        let processed = process_story_image(png_bytes(2400, 1600), 80).await.unwrap();
        let img = image::load_from_memory(&processed).unwrap();

        assert!(img.width() <= MAX_IMAGE_WIDTH);
        assert!(img.height() <= MAX_IMAGE_HEIGHT);
        // Aspect ratio preserved (3:2)
        assert_eq!(img.width() * 2, img.height() * 3);
    }

    #[tokio::test]
    async fn test_small_image_is_not_upscaled() {
        let processed = process_story_image(png_bytes(300, 200), 80).await.unwrap();
        let img = image::load_from_memory(&processed).unwrap();

        assert_eq!(img.width(), 300);
        assert_eq!(img.height(), 200);
    }

    #[tokio::test]
    async fn test_output_is_jpeg() {
        let processed = process_story_image(png_bytes(10, 10), 80).await.unwrap();
        assert_eq!(&processed[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_garbage_input_rejected() {
        let err = process_story_image(b"not an image".to_vec(), 80)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Image(_)));
    }
}
