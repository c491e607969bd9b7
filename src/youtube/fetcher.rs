//! Transcript fetching with retry and failure classification.

use super::transcript::{Transcript, TranscriptSource};
use crate::config::TranscriptSettings;
use crate::error::{Result, TranscriptError};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{info, instrument, warn};

static IP_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bip\b").expect("Invalid regex"));

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Attempt `n` (zero-based) is followed by a wait of `base_delay * (n + 1)`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }
}

/// Failure categories recognised in provider error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    CaptionsDisabled,
    Blocked,
    RateLimited,
    Unavailable,
    NoTranscript,
    Unknown,
}

impl FailureKind {
    /// Whether another attempt may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::RateLimited | FailureKind::Unknown)
    }
}

/// Classify a provider error message. Checks run in order; the first match wins.
pub fn classify(message: &str) -> FailureKind {
    let msg = message.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| msg.contains(n));

    if has(&["disabled"]) {
        FailureKind::CaptionsDisabled
    } else if has(&["blocked", "blocking", "cloud provider"]) || IP_WORD.is_match(&msg) {
        FailureKind::Blocked
    } else if has(&["too many", "rate limit", "429"]) {
        FailureKind::RateLimited
    } else if has(&["unavailable", "private", "deleted"]) {
        FailureKind::Unavailable
    } else if has(&["no transcript", "not found"]) {
        FailureKind::NoTranscript
    } else {
        FailureKind::Unknown
    }
}

/// Fetches transcripts from a [`TranscriptSource`], retrying transient failures.
pub struct TranscriptFetcher {
    source: Arc<dyn TranscriptSource>,
    languages: Vec<String>,
    policy: RetryPolicy,
}

impl TranscriptFetcher {
    pub fn new(source: Arc<dyn TranscriptSource>, languages: Vec<String>, policy: RetryPolicy) -> Self {
        Self {
            source,
            languages,
            policy,
        }
    }

    /// Build a fetcher from transcript settings.
    pub fn from_settings(source: Arc<dyn TranscriptSource>, settings: &TranscriptSettings) -> Self {
        Self::new(
            source,
            settings.languages.clone(),
            RetryPolicy {
                max_attempts: settings.max_attempts,
                base_delay: Duration::from_secs(settings.retry_delay_seconds),
            },
        )
    }

    /// Fetch a transcript, mapping provider failures onto [`TranscriptError`].
    #[instrument(skip(self))]
    pub async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 0..max_attempts {
            let err = match self.source.fetch(video_id, &self.languages).await {
                Ok(transcript) => {
                    info!(
                        "Fetched transcript for {} ({} segments)",
                        video_id,
                        transcript.segments.len()
                    );
                    return Ok(transcript);
                }
                Err(e) => e,
            };

            let kind = classify(&err.0);
            let last_attempt = attempt + 1 >= max_attempts;

            if kind.is_retryable() && !last_attempt {
                let wait = self.policy.delay_after(attempt);
                warn!(
                    "Transcript fetch for {} failed (attempt {}/{}), retrying in {:?}: {}",
                    video_id,
                    attempt + 1,
                    max_attempts,
                    wait,
                    err
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            return Err(self.to_error(kind, video_id, &err.0).into());
        }

        Err(TranscriptError::Other(format!(
            "Failed to fetch transcript for video {} after {} attempts. \
             Please try again later or use a different video.",
            video_id, max_attempts
        ))
        .into())
    }

    fn to_error(&self, kind: FailureKind, video_id: &str, message: &str) -> TranscriptError {
        let video_id = video_id.to_string();
        match kind {
            FailureKind::CaptionsDisabled => TranscriptError::CaptionsDisabled { video_id },
            FailureKind::Blocked => TranscriptError::Blocked { video_id },
            FailureKind::RateLimited => TranscriptError::RateLimited { video_id },
            FailureKind::Unavailable => TranscriptError::Unavailable { video_id },
            FailureKind::NoTranscript => TranscriptError::NoTranscript {
                video_id,
                languages: self.languages.join(", "),
            },
            FailureKind::Unknown => TranscriptError::Other(message.to_string()),
        }
    }
}
