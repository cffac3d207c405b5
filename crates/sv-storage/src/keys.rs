//! Object key layout and URL parsing.
//!
//! All story assets live under `stories/{story_id}/` with one subfolder per
//! asset class: `images/`, `audio/`, `exports/`.

use url::Url;

/// Key for an export artifact (PDF, ZIP, HTML).
pub fn export_key(story_id: &str, file_name: &str) -> String {
    format!("stories/{}/exports/{}", story_id, file_name)
}

/// Key for an uploaded page image.
pub fn image_key(story_id: &str, page_number: &str, file_name: &str) -> String {
    format!(
        "stories/{}/images/page_{}_{}",
        story_id, page_number, file_name
    )
}

/// Key for an uploaded audio file.
pub fn audio_key(story_id: &str, page_number: &str, file_name: &str) -> String {
    format!(
        "stories/{}/audio/page_{}_{}",
        story_id, page_number, file_name
    )
}

/// Bucket and key parsed from a virtual-hosted S3 URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedObjectUrl {
    pub bucket: String,
    pub key: String,
}

/// Parse a virtual-hosted object store URL
/// (`https://{bucket}.s3.{region}.amazonaws.com/{key}`).
///
/// Returns `None` for anything else; callers fall back to a plain HTTP
/// download for non-store URLs.
pub fn parse_object_url(url: &str) -> Option<ParsedObjectUrl> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    if !host.ends_with(".amazonaws.com") {
        return None;
    }

    // bucket.s3.region.amazonaws.com
    let (bucket, rest) = host.split_once('.')?;
    if !rest.starts_with("s3.") || bucket.is_empty() {
        return None;
    }

    let key = parsed.path().trim_start_matches('/');
    if key.is_empty() {
        return None;
    }

    Some(ParsedObjectUrl {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(
            export_key("abc123", "abc123_17000.pdf"),
            "stories/abc123/exports/abc123_17000.pdf"
        );
        assert_eq!(
            image_key("abc123", "2", "f00.jpg"),
            "stories/abc123/images/page_2_f00.jpg"
        );
        assert_eq!(
            audio_key("abc123", "0", "f00.mp3"),
            "stories/abc123/audio/page_0_f00.mp3"
        );
    }

    #[test]
    fn test_parse_virtual_hosted_url() {
        let parsed = parse_object_url(
            "https://storyverse-media.s3.us-east-1.amazonaws.com/stories/abc/images/page_1.jpg",
        )
        .unwrap();

        assert_eq!(parsed.bucket, "storyverse-media");
        assert_eq!(parsed.key, "stories/abc/images/page_1.jpg");
    }

    #[test]
    fn test_parse_rejects_non_store_urls() {
        assert_eq!(parse_object_url("https://example.com/image.jpg"), None);
        assert_eq!(parse_object_url("not a url"), None);
        assert_eq!(
            parse_object_url("https://bucket.s3.us-east-1.amazonaws.com/"),
            None
        );
    }
}
