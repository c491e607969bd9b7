//! YouTube access: video ID parsing and transcript retrieval.

mod fetcher;
mod transcript;
mod video_id;

pub use fetcher::{classify, FailureKind, RetryPolicy, TranscriptFetcher};
pub use transcript::{
    SourceError, Transcript, TranscriptSegment, TranscriptSource, YoutubeTranscriptSource,
};
pub use video_id::{extract_video_id, is_valid_video_id};
