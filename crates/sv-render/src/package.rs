//! Export package assembly.
//!
//! Builds a per-request scratch directory containing the rendered PDF, a
//! JSON dump of the story, and best-effort downloads of page images and
//! narration audio, then archives it to a ZIP at maximum compression.
//!
//! Asset downloads never fail the export: each failure is recorded in the
//! returned [`PackageOutcome`] instead. Downloads run through a bounded
//! pool so a many-page story cannot open unbounded upstream connections.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use tempfile::TempDir;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use sv_models::{PackageOutcome, Story};
use sv_storage::{parse_object_url, S3Client};

use crate::error::{RenderError, RenderResult};
use crate::pdf::render_pdf;

/// Concurrent asset downloads per package build.
pub const DOWNLOAD_CONCURRENCY: usize = 4;

/// A finished package archive.
///
/// Holds the scratch directory guard: dropping the archive removes the
/// package directory and the ZIP on every exit path.
pub struct PackageArchive {
    _scratch: TempDir,
    zip_path: PathBuf,
}

impl PackageArchive {
    /// Path of the ZIP file, valid for the lifetime of this value.
    pub fn zip_path(&self) -> &Path {
        &self.zip_path
    }
}

/// Assemble a story package and compress it to a ZIP.
pub async fn build_package(
    story: &Story,
    http: &reqwest::Client,
    storage: &S3Client,
) -> RenderResult<(PackageArchive, PackageOutcome)> {
    let scratch = TempDir::new()?;
    let package_dir = scratch.path().join("package");
    tokio::fs::create_dir_all(&package_dir).await?;

    let mut outcome = PackageOutcome::default();

    // The PDF and the story dump are mandatory; failure here fails the export.
    let pdf_name = format!("{}.pdf", sanitize_file_stem(story.title_or_default()));
    render_pdf(story, package_dir.join(&pdf_name)).await?;
    outcome.record_bundled(pdf_name);

    let json = serde_json::to_vec_pretty(story)?;
    tokio::fs::write(package_dir.join("story.json"), json).await?;
    outcome.record_bundled("story.json");

    // Page images, best-effort.
    let image_tasks: Vec<(String, String)> = story
        .pages()
        .iter()
        .filter_map(|page| {
            page.image_url
                .as_ref()
                .map(|url| (url.clone(), format!("images/page_{}.jpg", page.page_number)))
        })
        .collect();

    if !image_tasks.is_empty() {
        tokio::fs::create_dir_all(package_dir.join("images")).await?;

        let mut results: Vec<(String, RenderResult<()>)> = stream::iter(image_tasks)
            .map(|(url, rel)| {
                let dest = package_dir.join(&rel);
                async move {
                    let result = download_asset(http, storage, &url, &dest).await;
                    (rel, result)
                }
            })
            .buffer_unordered(DOWNLOAD_CONCURRENCY)
            .collect()
            .await;
        results.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (rel, result) in results {
            match result {
                Ok(()) => outcome.record_bundled(rel),
                Err(e) => {
                    warn!(asset = %rel, "Skipping package asset: {}", e);
                    outcome.record_failure(rel, e.to_string());
                }
            }
        }
    }

    // Narration audio, best-effort.
    if let Some(audio_url) = story.media_options.audio_url.as_deref() {
        let rel = "audio/narration.mp3";
        tokio::fs::create_dir_all(package_dir.join("audio")).await?;
        match download_asset(http, storage, audio_url, &package_dir.join(rel)).await {
            Ok(()) => outcome.record_bundled(rel),
            Err(e) => {
                warn!(asset = %rel, "Skipping package asset: {}", e);
                outcome.record_failure(rel, e.to_string());
            }
        }
    }

    // Archive
    let zip_path = scratch.path().join("package.zip");
    {
        let package_dir = package_dir.clone();
        let zip_path = zip_path.clone();
        tokio::task::spawn_blocking(move || zip_dir(&package_dir, &zip_path))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))??;
    }

    debug!(
        bundled = outcome.bundled.len(),
        failed = outcome.failed.len(),
        "Built story package"
    );

    Ok((
        PackageArchive {
            _scratch: scratch,
            zip_path,
        },
        outcome,
    ))
}

/// Download one asset to `dest`.
///
/// Object-store URLs are fetched through the storage client by parsed
/// bucket/key; anything else goes through the shared HTTP client.
async fn download_asset(
    http: &reqwest::Client,
    storage: &S3Client,
    url: &str,
    dest: &Path,
) -> RenderResult<()> {
    let bytes = if let Some(parsed) = parse_object_url(url) {
        storage
            .download_bytes_from(&parsed.bucket, &parsed.key)
            .await?
    } else {
        let response = http.get(url).send().await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };

    tokio::fs::write(dest, bytes).await?;
    Ok(())
}

/// Archive a directory into a deflate-9 ZIP.
fn zip_dir(src_dir: &Path, zip_path: &Path) -> RenderResult<()> {
    let file = File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    add_dir_entries(&mut zip, src_dir, src_dir, options)?;

    zip.finish().map_err(|e| RenderError::Zip(e.to_string()))?;
    Ok(())
}

fn add_dir_entries(
    zip: &mut ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: SimpleFileOptions,
) -> RenderResult<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    // Stable archive layout regardless of directory iteration order.
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .map_err(|e| RenderError::Zip(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");

        if path.is_dir() {
            zip.add_directory(format!("{}/", rel), options)
                .map_err(|e| RenderError::Zip(e.to_string()))?;
            add_dir_entries(zip, root, &path, options)?;
        } else {
            zip.start_file(rel, options)
                .map_err(|e| RenderError::Zip(e.to_string()))?;
            let mut f = File::open(&path)?;
            io::copy(&mut f, zip)?;
        }
    }

    Ok(())
}

/// Sanitize a story title into a safe file stem.
fn sanitize_file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let stem = stem.trim().to_string();
    if stem.is_empty() {
        "story".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_models::{MediaOptions, StoryContent, StoryPage};
    use sv_storage::S3Config;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_storage() -> S3Client {
        S3Client::new(S3Config {
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
            bucket: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
        })
    }

    fn archive_names(zip_path: &Path) -> Vec<String> {
        let file = File::open(zip_path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        archive.file_names().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("The Great Quest"), "The Great Quest");
        assert_eq!(sanitize_file_stem("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_file_stem("!!!"), "___");
        assert_eq!(sanitize_file_stem(""), "story");
        assert_eq!(sanitize_file_stem("   "), "story");
    }

    #[test]
    fn test_zip_dir_preserves_layout() {
        let src = TempDir::new().unwrap();
        std::fs::write(src.path().join("a.txt"), b"alpha").unwrap();
        std::fs::create_dir(src.path().join("sub")).unwrap();
        std::fs::write(src.path().join("sub/b.txt"), b"beta").unwrap();

        let out = TempDir::new().unwrap();
        let zip_path = out.path().join("out.zip");
        zip_dir(src.path(), &zip_path).unwrap();

        let names = archive_names(&zip_path);
        assert!(names.contains(&"a.txt".to_string()));
        assert!(names.contains(&"sub/".to_string()));
        assert!(names.contains(&"sub/b.txt".to_string()));
    }

    #[tokio::test]
    async fn test_package_with_partial_image_failures() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/img1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegdata1".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img2.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegdata2".to_vec()))
            .mount(&server)
            .await;

        // Three pages: two with reachable images, one with no image at all.
        let story = Story {
            id: Some("abc123".to_string()),
            title: Some("Test".to_string()),
            content: Some(StoryContent {
                pages: Some(vec![
                    StoryPage {
                        page_number: 1,
                        text: Some("one".to_string()),
                        image_url: Some(format!("{}/img1.jpg", server.uri())),
                    },
                    StoryPage {
                        page_number: 2,
                        text: Some("two".to_string()),
                        image_url: None,
                    },
                    StoryPage {
                        page_number: 3,
                        text: Some("three".to_string()),
                        image_url: Some(format!("{}/img2.jpg", server.uri())),
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let http = reqwest::Client::new();
        let (archive, outcome) = build_package(&story, &http, &test_storage()).await.unwrap();

        let names = archive_names(archive.zip_path());
        assert!(names.contains(&"Test.pdf".to_string()));
        assert!(names.contains(&"story.json".to_string()));
        assert!(names.contains(&"images/page_1.jpg".to_string()));
        assert!(names.contains(&"images/page_3.jpg".to_string()));
        assert_eq!(
            names.iter().filter(|n| n.starts_with("images/") && !n.ends_with('/')).count(),
            2
        );

        assert!(outcome.is_complete());
        assert_eq!(outcome.bundled.len(), 4);
    }

    #[tokio::test]
    async fn test_unreachable_asset_recorded_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken.jpg"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let story = Story {
            title: Some("Test".to_string()),
            content: Some(StoryContent {
                pages: Some(vec![StoryPage {
                    page_number: 1,
                    text: Some("one".to_string()),
                    image_url: Some(format!("{}/broken.jpg", server.uri())),
                }]),
                ..Default::default()
            }),
            media_options: MediaOptions {
                has_audio: true,
                audio_url: Some(format!("{}/missing.mp3", server.uri())),
                ..Default::default()
            },
            ..Default::default()
        };

        let http = reqwest::Client::new();
        let (archive, outcome) = build_package(&story, &http, &test_storage()).await.unwrap();

        // Export still succeeds with a degraded package.
        let names = archive_names(archive.zip_path());
        assert!(names.contains(&"Test.pdf".to_string()));
        assert!(names.contains(&"story.json".to_string()));
        assert!(!names.contains(&"images/page_1.jpg".to_string()));

        assert_eq!(outcome.failed.len(), 2);
        assert!(outcome
            .failed
            .iter()
            .any(|f| f.asset == "images/page_1.jpg"));
        assert!(outcome
            .failed
            .iter()
            .any(|f| f.asset == "audio/narration.mp3"));
    }

    #[tokio::test]
    async fn test_scratch_removed_on_drop() {
        let story = Story {
            title: Some("Test".to_string()),
            ..Default::default()
        };

        let http = reqwest::Client::new();
        let (archive, _) = build_package(&story, &http, &test_storage()).await.unwrap();

        let zip_path = archive.zip_path().to_path_buf();
        assert!(zip_path.exists());
        drop(archive);
        assert!(!zip_path.exists());
    }
}
