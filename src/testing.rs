//! Test doubles for the external services.

use crate::embedding::Embedder;
use crate::error::{Result, TubechatError};
use crate::rag::ChatModel;
use crate::youtube::{SourceError, Transcript, TranscriptSegment, TranscriptSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serves a fixed two-line transcript, or always fails with `failure`.
pub struct FakeSource {
    calls: AtomicUsize,
    failure: Option<String>,
}

impl FakeSource {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failure: None,
        })
    }

    pub fn failing(msg: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failure: Some(msg.to_string()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptSource for FakeSource {
    async fn fetch(
        &self,
        video_id: &str,
        _languages: &[String],
    ) -> std::result::Result<Transcript, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.failure {
            return Err(SourceError(msg.clone()));
        }
        Ok(Transcript::new(
            video_id,
            vec![
                TranscriptSegment::new("Today we talk about rust ownership.", 0.0, 3.0),
                TranscriptSegment::new("Later we make some coffee.", 3.0, 3.0),
            ],
        ))
    }
}

/// Embeds text as keyword counts.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        Ok(["rust", "coffee"]
            .iter()
            .map(|k| text.matches(k).count() as f32 + 0.01)
            .collect())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.embed(t).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Answers with the size of the prompt it received.
pub struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(format!("prompt had {} chars", prompt.len()))
    }
}

/// Always fails as if the chat API were down.
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(TubechatError::OpenAI("service unavailable".to_string()))
    }
}
