//! Error types for tubechat.

use thiserror::Error;

/// Why a transcript could not be fetched.
///
/// Every variant carries a message meant to be shown to the API client as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("No captions/transcripts are available for video {video_id}. The video may not have captions enabled.")]
    CaptionsDisabled { video_id: String },

    #[error(
        "YouTube is blocking requests from this server (cloud provider IP detected).\n\n\
         This is a known limitation when deploying to cloud providers like Render, AWS, GCP, etc.\n\n\
         **Solutions:**\n\
         1. Wait 10-30 minutes and try again (IP blocks are often temporary)\n\
         2. Try a different video with captions enabled\n\
         3. Use a residential proxy service (requires additional setup)\n\
         4. Consider using YouTube Data API v3 (official API)\n\n\
         Video ID: {video_id}"
    )]
    Blocked { video_id: String },

    #[error("YouTube is rate-limiting requests. Please try again in a few minutes. Video: {video_id}")]
    RateLimited { video_id: String },

    #[error("Video {video_id} is unavailable. It may be private, deleted, or age-restricted.")]
    Unavailable { video_id: String },

    #[error("No transcript found for video {video_id} in the requested languages ({languages}). The video may not have captions in these languages.")]
    NoTranscript { video_id: String, languages: String },

    #[error("Error fetching transcript: {0}")]
    Other(String),
}

/// Library-level error type for tubechat operations.
#[derive(Error, Debug)]
pub enum TubechatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Transcript(#[from] TranscriptError),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Error generating answer: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Video {0} not processed. Please process the video first.")]
    VideoNotProcessed(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl TubechatError {
    /// Whether the error was caused by the request rather than by the server.
    ///
    /// Client errors map to HTTP 400, everything else to 500.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TubechatError::Transcript(_)
                | TubechatError::VideoNotProcessed(_)
                | TubechatError::InvalidInput(_)
        )
    }
}

/// Result type alias for tubechat operations.
pub type Result<T> = std::result::Result<T, TubechatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(TubechatError::InvalidInput("bad".to_string()).is_client_error());
        assert!(TubechatError::VideoNotProcessed("abc".to_string()).is_client_error());
        assert!(TubechatError::from(TranscriptError::Other("boom".to_string())).is_client_error());

        assert!(!TubechatError::Generation("llm down".to_string()).is_client_error());
        assert!(!TubechatError::VectorStore("corrupt".to_string()).is_client_error());
    }

    #[test]
    fn test_transcript_messages() {
        let err = TranscriptError::Unavailable {
            video_id: "dQw4w9WgXcQ".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Video dQw4w9WgXcQ is unavailable. It may be private, deleted, or age-restricted."
        );

        let err = TranscriptError::Blocked {
            video_id: "dQw4w9WgXcQ".to_string(),
        };
        assert!(err.to_string().contains("**Solutions:**"));
        assert!(err.to_string().ends_with("Video ID: dQw4w9WgXcQ"));
    }
}
