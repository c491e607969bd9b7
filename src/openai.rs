//! OpenAI client configuration with sensible defaults.

use crate::config::OpenAISettings;
use crate::error::{Result, TubechatError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from settings.
///
/// Without an explicit key, async-openai falls back to `OPENAI_API_KEY`.
pub fn create_client(settings: &OpenAISettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .build()?;

    let mut config = OpenAIConfig::default();
    if let Some(key) = &settings.api_key {
        config = config.with_api_key(key);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Report whether an API key is available from settings or the environment.
pub fn ensure_api_key(settings: &OpenAISettings) -> Result<()> {
    let configured = settings.api_key.as_ref().is_some_and(|k| !k.is_empty())
        || std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty());

    if configured {
        Ok(())
    } else {
        Err(TubechatError::Config(
            "OPENAI_API_KEY is not set. Export it or add it to your .env file.".to_string(),
        ))
    }
}
