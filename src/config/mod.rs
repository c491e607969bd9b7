//! Configuration module for tubechat.
//!
//! Handles loading application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, LlmSettings, OpenAISettings, PromptSettings,
    RetrievalSettings, ServerSettings, Settings, StorageSettings, TranscriptSettings,
};
