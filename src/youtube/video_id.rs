//! YouTube video ID extraction.

use crate::error::{Result, TubechatError};
use regex::Regex;
use std::sync::LazyLock;

/// `watch?v=`, `youtu.be/` and `embed/` URLs with the ID right after the marker.
static DIRECT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})")
        .expect("Invalid regex")
});

/// `watch` URLs where `v=` follows other query parameters.
static WATCH_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"youtube\.com/watch\?.*v=([a-zA-Z0-9_-]{11})").expect("Invalid regex")
});

/// Check whether `s` looks like a bare YouTube video ID.
pub fn is_valid_video_id(s: &str) -> bool {
    s.len() == 11
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extract the video ID from a YouTube URL, or accept a bare video ID.
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    for pattern in [&*DIRECT_URL, &*WATCH_QUERY] {
        if let Some(id) = pattern.captures(input).and_then(|caps| caps.get(1)) {
            return Ok(id.as_str().to_string());
        }
    }

    if is_valid_video_id(input) {
        return Ok(input.to_string());
    }

    Err(TubechatError::InvalidInput(format!(
        "Invalid YouTube URL or video ID: {}",
        input
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?feature=shared").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://youtube.com/embed/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=PL123&index=2&v=dQw4w9WgXcQ")
                .unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(extract_video_id("  5_EJwYeQusM ").unwrap(), "5_EJwYeQusM");
    }

    #[test]
    fn test_invalid_inputs() {
        for input in ["", "not-a-video-id", "https://vimeo.com/123456789", "../../etc/pwd"] {
            let err = extract_video_id(input).unwrap_err();
            assert!(matches!(err, TubechatError::InvalidInput(_)), "{input}");
        }
    }

    #[test]
    fn test_is_valid_video_id() {
        assert!(is_valid_video_id("dQw4w9WgXcQ"));
        assert!(is_valid_video_id("a-b_c-d_e-f"));
        assert!(!is_valid_video_id("dQw4w9WgXc"));
        assert!(!is_valid_video_id("dQw4w9WgX/Q"));
        assert!(!is_valid_video_id("dQw4w9WgXcQQ"));
    }
}
