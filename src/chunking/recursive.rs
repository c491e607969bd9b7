//! Recursive character text splitting.
//!
//! Splits on the coarsest separator present in the text, merges the pieces back
//! into chunks of at most `chunk_size` characters with `chunk_overlap` characters
//! carried over, and recurses into pieces that are still too long.

use super::Chunker;
use crate::config::ChunkingSettings;
use crate::error::{Result, TubechatError};
use std::collections::VecDeque;

/// Separators tried in order, from paragraphs down to single characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character splitter.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// Create a splitter with the default separators.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(TubechatError::Config("chunk_size must be greater than 0".to_string()));
        }
        if chunk_overlap > chunk_size {
            return Err(TubechatError::Config(format!(
                "chunk_overlap ({}) is larger than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Replace the separator list.
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();

        // First separator present in the text; "" always matches.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces = split_keeping_separator(text, separator);

        let mut short_pieces: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                short_pieces.push(piece);
                continue;
            }

            if !short_pieces.is_empty() {
                chunks.extend(self.merge_pieces(&short_pieces));
                short_pieces.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !short_pieces.is_empty() {
            chunks.extend(self.merge_pieces(&short_pieces));
        }

        chunks
    }

    /// Greedily pack pieces into chunks, keeping an overlapping tail.
    ///
    /// Pieces already carry their separator, so they are concatenated as-is.
    fn merge_pieces(&self, pieces: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                push_trimmed(&mut chunks, &current);

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        push_trimmed(&mut chunks, &current);
        chunks
    }
}

impl Chunker for RecursiveCharacterSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn push_trimmed(chunks: &mut Vec<String>, pieces: &VecDeque<&str>) {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split `text` on `separator`, attaching each separator to the piece that follows it.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(|c| c.to_string()).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();
    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    pieces.extend(parts.map(|p| format!("{}{}", separator, p)));
    pieces.retain(|p| !p.is_empty());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveCharacterSplitter::new(100, 20).unwrap();
        let chunks = splitter.split_text("  a short transcript  ");
        assert_eq!(chunks, vec!["a short transcript".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        let splitter = RecursiveCharacterSplitter::new(100, 20).unwrap();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   ").is_empty());
    }

    #[test]
    fn test_words_respect_size_and_overlap() {
        let splitter = RecursiveCharacterSplitter::new(10, 4).unwrap();
        let chunks = splitter.split_text("aaa bbb ccc ddd eee");

        assert_eq!(
            chunks,
            vec![
                "aaa bbb".to_string(),
                "bbb ccc".to_string(),
                "ccc ddd".to_string(),
                "ddd eee".to_string(),
            ]
        );
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_without_overlap() {
        let splitter = RecursiveCharacterSplitter::new(7, 0).unwrap();
        let chunks = splitter.split_text("aaa bbb ccc");
        assert_eq!(chunks, vec!["aaa bbb".to_string(), "ccc".to_string()]);
    }

    #[test]
    fn test_paragraphs_split_first() {
        let splitter = RecursiveCharacterSplitter::new(12, 0).unwrap();
        let chunks = splitter.split_text("first para\n\nsecond para");
        assert_eq!(chunks, vec!["first para".to_string(), "second para".to_string()]);
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let splitter = RecursiveCharacterSplitter::new(4, 0).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(
            chunks,
            vec!["abcd".to_string(), "efgh".to_string(), "ij".to_string()]
        );
    }

    #[test]
    fn test_multibyte_characters_count_as_one() {
        let splitter = RecursiveCharacterSplitter::new(3, 0).unwrap();
        let chunks = splitter.split_text("ñññññ");
        assert_eq!(chunks, vec!["ñññ".to_string(), "ññ".to_string()]);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(RecursiveCharacterSplitter::new(0, 0).is_err());
        assert!(RecursiveCharacterSplitter::new(100, 200).is_err());
    }

    #[test]
    fn test_custom_separators() {
        let splitter = RecursiveCharacterSplitter::new(10, 0)
            .unwrap()
            .with_separators(vec![". ".to_string(), "".to_string()]);
        assert_eq!(
            splitter.split_text("aaaa. bbbb. cccc"),
            vec!["aaaa. bbbb".to_string(), ". cccc".to_string()]
        );
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a b c", " "),
            vec!["a".to_string(), " b".to_string(), " c".to_string()]
        );
        assert_eq!(
            split_keeping_separator("ab", ""),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
