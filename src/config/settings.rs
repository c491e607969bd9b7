//! Configuration settings for tubechat.

use crate::error::{Result, TubechatError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub openai: OpenAISettings,
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub transcript: TranscriptSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub prompts: PromptSettings,
}

/// OpenAI API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API key. When unset, async-openai reads `OPENAI_API_KEY` itself.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout_seconds: 300,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:3001".to_string(),
                "http://127.0.0.1:3001".to_string(),
            ],
        }
    }
}

/// Where per-video index files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub vector_store_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            vector_store_dir: "./vector_stores".to_string(),
        }
    }
}

/// Transcript fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred transcript languages, in order.
    pub languages: Vec<String>,
    /// Total fetch attempts before giving up.
    pub max_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_delay_seconds`.
    pub retry_delay_seconds: u64,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            max_attempts: 3,
            retry_delay_seconds: 2,
        }
    }
}

/// Text splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks handed to the LLM per question.
    pub k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 4 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory holding a `rag.toml` that overrides the built-in prompt.
    pub custom_dir: Option<String>,
    /// Custom variables available in the prompt as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file, then apply the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path (or the default location), then apply the environment.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_with(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Override settings from environment-style variables.
    ///
    /// `lookup` returns the value of a variable, if set.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_TIMEOUT_SECS") {
            self.openai.timeout_seconds = parse_var("OPENAI_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = get("CORS_ORIGINS") {
            self.server.cors_origins = split_list(&v);
        }
        if let Some(v) = get("VECTOR_STORE_DIR") {
            self.storage.vector_store_dir = v;
        }
        if let Some(v) = get("TRANSCRIPT_LANGUAGES") {
            self.transcript.languages = split_list(&v);
        }
        if let Some(v) = get("TRANSCRIPT_MAX_ATTEMPTS") {
            self.transcript.max_attempts = parse_var("TRANSCRIPT_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("TRANSCRIPT_RETRY_DELAY_SECS") {
            self.transcript.retry_delay_seconds = parse_var("TRANSCRIPT_RETRY_DELAY_SECS", &v)?;
        }
        if let Some(v) = get("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_var("CHUNK_SIZE", &v)?;
        }
        if let Some(v) = get("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_var("CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = get("EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = get("EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = parse_var("EMBEDDING_DIMENSIONS", &v)?;
        }
        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("LLM_TEMPERATURE") {
            self.llm.temperature = parse_var("LLM_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("RETRIEVER_K") {
            self.retrieval.k = parse_var("RETRIEVER_K", &v)?;
        }

        Ok(())
    }

    /// Reject combinations that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(TubechatError::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunking.chunk_overlap > self.chunking.chunk_size {
            return Err(TubechatError::Config(format!(
                "chunk_overlap ({}) is larger than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.k == 0 {
            return Err(TubechatError::Config("retrieval k must be at least 1".to_string()));
        }
        if self.transcript.max_attempts == 0 {
            return Err(TubechatError::Config(
                "transcript max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubechat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded vector store directory.
    pub fn vector_store_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.vector_store_dir)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TubechatError::Config(format!("Invalid value for {}: {:?}", key, value)))
}

/// Split a comma-separated list, dropping blank entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.retrieval.k, 4);
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
        assert_eq!(settings.server.cors_origins.len(), 6);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("CORS_ORIGINS", "https://a.example, ,https://b.example"),
            ("CHUNK_SIZE", "500"),
            ("CHUNK_OVERLAP", "50"),
            ("LLM_TEMPERATURE", "0.7"),
            ("RETRIEVER_K", "6"),
            ("VECTOR_STORE_DIR", "/tmp/indexes"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);

        let mut settings = Settings::default();
        settings.apply_env_with(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(
            settings.server.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(settings.chunking.chunk_size, 500);
        assert_eq!(settings.chunking.chunk_overlap, 50);
        assert!((settings.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(settings.retrieval.k, 6);
        assert_eq!(settings.vector_store_dir(), PathBuf::from("/tmp/indexes"));
        assert_eq!(settings.openai.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_invalid_env_value() {
        let vars = env(&[("CHUNK_SIZE", "lots")]);
        let mut settings = Settings::default();
        let err = settings.apply_env_with(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, TubechatError::Config(_)));
    }

    #[test]
    fn test_overlap_larger_than_size_rejected() {
        let mut settings = Settings::default();
        settings.chunking.chunk_size = 100;
        settings.chunking.chunk_overlap = 200;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_toml_sections() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            model = "gpt-4o"

            [retrieval]
            k = 8
            "#,
        )
        .unwrap();

        assert_eq!(settings.llm.model, "gpt-4o");
        assert!((settings.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(settings.retrieval.k, 8);
        assert_eq!(settings.chunking.chunk_size, 1000);
    }
}
