//! Transcript chunking for embedding and retrieval.

mod recursive;

pub use recursive::{RecursiveCharacterSplitter, DEFAULT_SEPARATORS};

use crate::youtube::Transcript;
use serde::{Deserialize, Serialize};

/// A chunk of transcript text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Position of this chunk in the transcript.
    pub order: i32,
}

/// Trait for text chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split raw text into chunks.
    fn split_text(&self, text: &str) -> Vec<String>;

    /// Split a transcript's plain text into ordered chunks.
    fn chunk(&self, transcript: &Transcript) -> Vec<ContentChunk> {
        self.split_text(&transcript.text())
            .into_iter()
            .enumerate()
            .map(|(i, content)| ContentChunk {
                content,
                order: i as i32,
            })
            .collect()
    }
}
