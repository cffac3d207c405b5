//! Input validation for path parameters.
//!
//! Story IDs and object keys arrive in URL paths and end up in object-store
//! keys and scratch file names, so both are validated before use.

/// Validate story ID format.
///
/// Valid format: alphanumeric, hyphens, underscores; 1-64 chars.
pub fn is_valid_story_id(id: &str) -> bool {
    if id.is_empty() || id.len() > 64 {
        return false;
    }
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate an object key taken from a URL path.
///
/// Keys contain slashes but must not escape the bucket namespace.
pub fn is_valid_object_key(key: &str) -> bool {
    if key.is_empty() || key.len() > 1024 {
        return false;
    }
    if key.starts_with('/') || key.contains("..") || key.contains('\\') {
        return false;
    }
    key.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_id_validation() {
        assert!(is_valid_story_id("abc123"));
        assert!(is_valid_story_id("656a1f77c2e9a2d4e8b0f0aa"));
        assert!(is_valid_story_id("story_1-draft"));
        assert!(!is_valid_story_id(""));
        assert!(!is_valid_story_id("has/slash"));
        assert!(!is_valid_story_id("has..dots"));
        assert!(!is_valid_story_id(&"a".repeat(65)));
    }

    #[test]
    fn test_object_key_validation() {
        assert!(is_valid_object_key("stories/abc/images/page_1_f00.jpg"));
        assert!(is_valid_object_key("stories/abc/exports/abc_1700.zip"));
        assert!(!is_valid_object_key("/absolute/key"));
        assert!(!is_valid_object_key("stories/../etc/passwd"));
        assert!(!is_valid_object_key(""));
    }
}
