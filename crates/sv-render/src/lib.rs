//! Story export rendering.
//!
//! This crate turns story documents into deliverable artifacts:
//! - Paginated PDF documents (`pdf`)
//! - Self-contained HTML documents (`html`) — a pure, deterministic transform
//! - ZIP packages bundling the PDF, the story JSON, and best-effort
//!   downloads of page images and narration audio (`package`)
//! - Upload image resizing and JPEG re-encoding (`images`)
//!
//! All scratch space is scoped to `tempfile` guards, so partial artifacts
//! are removed on every exit path.

pub mod error;
pub mod html;
pub mod images;
pub mod package;
pub mod pdf;

pub use error::{RenderError, RenderResult};
pub use html::render_html;
pub use images::{process_story_image, DEFAULT_JPEG_QUALITY, MAX_IMAGE_HEIGHT, MAX_IMAGE_WIDTH};
pub use package::{build_package, PackageArchive, DOWNLOAD_CONCURRENCY};
pub use pdf::render_pdf;
