//! Transcript models and the YouTube transcript source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// A timed caption line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// The captions of one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    /// Language code of the captions (e.g. "en").
    pub language_code: String,
    /// Whether YouTube generated the captions automatically.
    pub is_generated: bool,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn new(video_id: impl Into<String>, segments: Vec<TranscriptSegment>) -> Self {
        Self {
            video_id: video_id.into(),
            language_code: "en".to_string(),
            is_generated: false,
            segments,
        }
    }

    /// Plain text of the transcript, segments joined by a single space.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// End of the last segment, in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.start_seconds + s.duration_seconds)
            .unwrap_or(0.0)
    }
}

/// A transcript provider failure, carrying the provider's own message.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct SourceError(pub String);

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript of `video_id` in the first available of `languages`.
    async fn fetch(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> std::result::Result<Transcript, SourceError>;
}

/// Transcript source backed by YouTube's caption tracks.
pub struct YoutubeTranscriptSource {
    api: YouTubeTranscriptApi,
}

impl YoutubeTranscriptSource {
    /// Create a source without proxy or cookie authentication.
    pub fn new() -> crate::error::Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None).map_err(|e| {
            crate::error::TubechatError::Config(format!(
                "Failed to create YouTube transcript client: {}",
                e
            ))
        })?;
        Ok(Self { api })
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self))]
    async fn fetch(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> std::result::Result<Transcript, SourceError> {
        let languages: Vec<&str> = languages.iter().map(String::as_str).collect();

        let fetched = self
            .api
            .fetch_transcript(video_id, &languages, false)
            .await
            .map_err(|e| SourceError(e.to_string()))?;

        debug!(
            "Fetched {} caption snippets ({}, generated: {})",
            fetched.snippets.len(),
            fetched.language_code,
            fetched.is_generated
        );

        Ok(Transcript {
            video_id: video_id.to_string(),
            language_code: fetched.language_code.clone(),
            is_generated: fetched.is_generated,
            segments: fetched
                .snippets
                .iter()
                .map(|s| TranscriptSegment::new(s.text.clone(), s.start, s.duration))
                .collect(),
        })
    }
}
