//! Media catalogue and export outcome types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Class of a stored media object, derived from its key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Audio,
    Unknown,
}

impl MediaType {
    /// Classify an object-store key by its path segment.
    pub fn from_key(key: &str) -> Self {
        if key.contains("/images/") {
            MediaType::Image
        } else if key.contains("/audio/") {
            MediaType::Audio
        } else {
            MediaType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Audio => "audio",
            MediaType::Unknown => "unknown",
        }
    }
}

/// A stored media object with a freshly signed URL.
///
/// The URL is derived on every listing and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub key: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    pub url: String,
}

/// A per-asset failure recorded while building an export package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetFailure {
    /// Package-relative asset path, e.g. `images/page_3.jpg`.
    pub asset: String,
    pub reason: String,
}

/// Result of best-effort package assembly: which assets made it into the
/// archive and which were skipped, with reasons.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackageOutcome {
    pub bundled: Vec<String>,
    pub failed: Vec<AssetFailure>,
}

impl PackageOutcome {
    pub fn record_bundled(&mut self, asset: impl Into<String>) {
        self.bundled.push(asset.into());
    }

    pub fn record_failure(&mut self, asset: impl Into<String>, reason: impl Into<String>) {
        self.failed.push(AssetFailure {
            asset: asset.into(),
            reason: reason.into(),
        });
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_key() {
        assert_eq!(
            MediaType::from_key("stories/abc/images/page_1.jpg"),
            MediaType::Image
        );
        assert_eq!(
            MediaType::from_key("stories/abc/audio/narration.mp3"),
            MediaType::Audio
        );
        assert_eq!(
            MediaType::from_key("stories/abc/exports/abc_1.pdf"),
            MediaType::Unknown
        );
    }

    #[test]
    fn test_package_outcome() {
        let mut outcome = PackageOutcome::default();
        outcome.record_bundled("story.pdf");
        outcome.record_bundled("images/page_1.jpg");
        outcome.record_failure("images/page_2.jpg", "connection refused");

        assert!(!outcome.is_complete());
        assert_eq!(outcome.bundled.len(), 2);
        assert_eq!(outcome.failed[0].asset, "images/page_2.jpg");
    }
}
