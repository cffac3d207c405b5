//! S3 object store client for the StoryVerse delivery backend.
//!
//! This crate provides:
//! - File and byte upload/download for exports and media assets
//! - Prefix listing for the per-story media catalogue
//! - Presigned GET URL generation with bounded expiry
//! - Object deletion and connectivity checks

pub mod client;
pub mod error;
pub mod keys;

pub use client::{ObjectInfo, S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use keys::{audio_key, export_key, image_key, parse_object_url, ParsedObjectUrl};
