//! Tubechat - chat with YouTube videos
//!
//! A backend that fetches a video's transcript, indexes it for semantic
//! search, and answers questions about it with an LLM.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `youtube` - Video ID parsing and transcript fetching
//! - `chunking` - Transcript splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Per-video vector indexes
//! - `rag` - Retrieval and answer generation
//! - `service` - Pipeline coordination and session state
//! - `server` - HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use tubechat::config::Settings;
//! use tubechat::service::RagService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let service = RagService::new(settings)?;
//!
//!     service.process_video(None, Some("https://youtu.be/dQw4w9WgXcQ")).await?;
//!     let answer = service.chat("dQw4w9WgXcQ", "What is this video about?").await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod rag;
pub mod server;
pub mod service;
pub mod vector_store;
pub mod youtube;

#[cfg(test)]
mod testing;

pub use error::{Result, TranscriptError, TubechatError};
