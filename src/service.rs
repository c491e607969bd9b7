//! Video processing and question answering.
//!
//! Coordinates transcript fetch, chunking, embedding, index persistence, and
//! the per-video retrieval chains kept in memory.

use crate::chunking::{Chunker, RecursiveCharacterSplitter};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TubechatError};
use crate::rag::{ChatModel, OpenAIChatModel, RagChain, Retriever};
use crate::vector_store::{index_path, Document, SqliteVectorStore, VectorStore};
use crate::youtube::{
    extract_video_id, is_valid_video_id, TranscriptFetcher, TranscriptSource,
    YoutubeTranscriptSource,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, instrument, warn};

/// In-memory state for a processed video.
pub struct VideoSession {
    pub index: Arc<dyn VectorStore>,
    pub chain: RagChain,
}

impl VideoSession {
    pub fn retriever(&self) -> &Retriever {
        self.chain.retriever()
    }
}

/// Result of processing a video.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProcessResult {
    pub video_id: String,
    pub status: String,
    pub message: String,
}

/// An answer to a question about a video.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatAnswer {
    pub video_id: String,
    pub question: String,
    pub answer: String,
}

/// Whether a video has an index on disk.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VideoStatus {
    pub video_id: String,
    pub status: String,
    pub exists: bool,
}

/// The RAG service shared by all requests.
pub struct RagService {
    settings: Settings,
    prompts: Prompts,
    fetcher: TranscriptFetcher,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn ChatModel>,
    storage_dir: PathBuf,
    sessions: RwLock<HashMap<String, Arc<VideoSession>>>,
}

impl RagService {
    /// Create a service backed by YouTube and OpenAI.
    pub fn new(settings: Settings) -> Result<Self> {
        let client = crate::openai::create_client(&settings.openai)?;
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(client.clone(), &settings.embedding));
        let llm: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::from_settings(client, &settings.llm));
        let source: Arc<dyn TranscriptSource> = Arc::new(YoutubeTranscriptSource::new()?);

        Self::with_components(settings, source, embedder, llm)
    }

    /// Create a service with custom components.
    pub fn with_components(
        settings: Settings,
        source: Arc<dyn TranscriptSource>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        settings.validate()?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let chunker = Arc::new(RecursiveCharacterSplitter::from_settings(&settings.chunking)?);
        let fetcher = TranscriptFetcher::from_settings(source, &settings.transcript);

        let storage_dir = settings.vector_store_dir();
        std::fs::create_dir_all(&storage_dir)?;
        info!("Storing indexes in {:?}", storage_dir);

        Ok(Self {
            settings,
            prompts,
            fetcher,
            chunker,
            embedder,
            llm,
            storage_dir,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Get the in-memory session for a video, if it has one.
    pub fn session(&self, video_id: &str) -> Option<Arc<VideoSession>> {
        self.sessions
            .read()
            .ok()
            .and_then(|s| s.get(video_id).cloned())
    }

    /// Process a video: fetch, chunk, embed, and index its transcript, then
    /// set up the question-answering chain.
    ///
    /// `youtube_url`, when given, takes precedence over `video_id`. An existing
    /// index file is reused unless it fails to load.
    #[instrument(skip(self))]
    pub async fn process_video(
        &self,
        video_id: Option<&str>,
        youtube_url: Option<&str>,
    ) -> Result<ProcessResult> {
        let video_id = resolve_video_id(video_id, youtube_url)?;
        let path = index_path(&self.storage_dir, &video_id);

        let index = match self.load_index(&video_id, &path) {
            Some(index) => {
                info!("Reusing index for {}", video_id);
                index
            }
            None => self.build_index(&video_id, &path).await?,
        };

        self.install_session(&video_id, index)?;

        Ok(ProcessResult {
            video_id,
            status: "processed".to_string(),
            message: "Video processed successfully".to_string(),
        })
    }

    /// Answer a question about a processed video.
    #[instrument(skip(self))]
    pub async fn chat(&self, video_id: &str, question: &str) -> Result<ChatAnswer> {
        if video_id.trim().is_empty() || question.trim().is_empty() {
            return Err(TubechatError::InvalidInput(
                "video_id and question are required".to_string(),
            ));
        }

        let session = match self.session(video_id) {
            Some(session) => session,
            None => self.restore_session(video_id)?,
        };

        let answer = session.chain.invoke(question).await.map_err(|e| match e {
            e @ TubechatError::Generation(_) => e,
            other => TubechatError::Generation(other.to_string()),
        })?;

        Ok(ChatAnswer {
            video_id: video_id.to_string(),
            question: question.to_string(),
            answer,
        })
    }

    /// Report whether a video has an index on disk.
    pub fn video_status(&self, video_id: &str) -> VideoStatus {
        let exists =
            is_valid_video_id(video_id) && index_path(&self.storage_dir, video_id).exists();

        VideoStatus {
            video_id: video_id.to_string(),
            status: if exists { "processed" } else { "not_processed" }.to_string(),
            exists,
        }
    }

    /// Rebuild a session from an index left on disk by an earlier run.
    fn restore_session(&self, video_id: &str) -> Result<Arc<VideoSession>> {
        if !is_valid_video_id(video_id) {
            return Err(TubechatError::VideoNotProcessed(video_id.to_string()));
        }

        let path = index_path(&self.storage_dir, video_id);
        let index = self
            .load_index(video_id, &path)
            .ok_or_else(|| TubechatError::VideoNotProcessed(video_id.to_string()))?;

        info!("Restored session for {} from disk", video_id);
        self.install_session(video_id, index)
    }

    /// Open an existing index. A file that fails to load is deleted.
    fn load_index(&self, video_id: &str, path: &Path) -> Option<Arc<dyn VectorStore>> {
        if !path.exists() {
            return None;
        }

        let opened = SqliteVectorStore::open(path).and_then(|store| {
            let model = store.embedding_model()?;
            if model.as_deref() != Some(self.settings.embedding.model.as_str()) {
                return Err(TubechatError::VectorStore(format!(
                    "index was built with embedding model {:?}",
                    model
                )));
            }
            let dimensions = store.embedding_dimensions()?;
            if dimensions != Some(self.embedder.dimensions()) {
                return Err(TubechatError::VectorStore(format!(
                    "index has {:?} embedding dimensions, expected {}",
                    dimensions,
                    self.embedder.dimensions()
                )));
            }
            Ok(store)
        });

        match opened {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!("Discarding index for {} at {:?}: {}", video_id, path, e);
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove index file {:?}: {}", path, e);
                }
                None
            }
        }
    }

    /// Fetch the transcript and write a fresh index.
    async fn build_index(&self, video_id: &str, path: &Path) -> Result<Arc<dyn VectorStore>> {
        let transcript = self.fetcher.fetch(video_id).await?;

        let chunks = self.chunker.chunk(&transcript);
        if chunks.is_empty() {
            return Err(TubechatError::InvalidInput(format!(
                "The transcript for video {} is empty.",
                video_id
            )));
        }
        info!("Split transcript into {} chunks", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(TubechatError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                Document::new(video_id.to_string(), chunk.content, chunk.order, embedding)
            })
            .collect();

        let store = SqliteVectorStore::create(
            path,
            &transcript,
            &self.settings.embedding.model,
            &documents,
        )?;
        Ok(Arc::new(store))
    }

    fn install_session(
        &self,
        video_id: &str,
        index: Arc<dyn VectorStore>,
    ) -> Result<Arc<VideoSession>> {
        let retriever = Retriever::new(index.clone(), self.embedder.clone(), self.settings.retrieval.k);
        let chain = RagChain::new(retriever, self.llm.clone(), self.prompts.clone());
        let session = Arc::new(VideoSession { index, chain });

        self.sessions
            .write()
            .map_err(|e| TubechatError::VectorStore(format!("Failed to acquire lock: {}", e)))?
            .insert(video_id.to_string(), session.clone());

        Ok(session)
    }
}

/// Pick the video ID from a URL (preferred) or an explicit ID.
fn resolve_video_id(video_id: Option<&str>, youtube_url: Option<&str>) -> Result<String> {
    fn non_empty(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }

    match (non_empty(youtube_url), non_empty(video_id)) {
        (Some(url), _) => extract_video_id(url),
        (None, Some(id)) if is_valid_video_id(id) => Ok(id.to_string()),
        (None, Some(id)) => Err(TubechatError::InvalidInput(format!(
            "Invalid YouTube URL or video ID: {}",
            id
        ))),
        (None, None) => Err(TubechatError::InvalidInput(
            "Either youtube_url or video_id must be provided".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscriptError;
    use crate::testing::{EchoModel, FailingModel, FakeSource, KeywordEmbedder};

    const VIDEO: &str = "dQw4w9WgXcQ";

    fn settings(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.storage.vector_store_dir = dir.to_string_lossy().to_string();
        settings.chunking.chunk_size = 40;
        settings.chunking.chunk_overlap = 0;
        settings.retrieval.k = 1;
        settings.transcript.retry_delay_seconds = 0;
        settings
    }

    fn service(dir: &Path, source: Arc<FakeSource>) -> RagService {
        RagService::with_components(
            settings(dir),
            source,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoModel),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_video_id() {
        assert_eq!(
            resolve_video_id(Some("ignored"), Some("https://youtu.be/dQw4w9WgXcQ")).unwrap(),
            VIDEO
        );
        assert_eq!(resolve_video_id(Some(VIDEO), Some("  ")).unwrap(), VIDEO);
        assert!(resolve_video_id(None, None).is_err());
        assert!(resolve_video_id(Some("../secret"), None).is_err());
    }

    #[tokio::test]
    async fn test_process_then_chat() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::ok();
        let service = service(dir.path(), source.clone());

        assert!(!service.video_status(VIDEO).exists);

        let result = service
            .process_video(None, Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ"))
            .await
            .unwrap();
        assert_eq!(result.video_id, VIDEO);
        assert_eq!(result.status, "processed");
        assert_eq!(result.message, "Video processed successfully");

        let status = service.video_status(VIDEO);
        assert!(status.exists);
        assert_eq!(status.status, "processed");

        let session = service.session(VIDEO).unwrap();
        assert_eq!(session.retriever().k(), 1);
        assert!(session.index.document_count().await.unwrap() >= 2);

        let answer = service.chat(VIDEO, "What about rust?").await.unwrap();
        assert_eq!(answer.video_id, VIDEO);
        assert_eq!(answer.question, "What about rust?");
        assert!(answer.answer.starts_with("prompt had"));
    }

    #[tokio::test]
    async fn test_existing_index_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::ok();
        let service = service(dir.path(), source.clone());

        service.process_video(Some(VIDEO), None).await.unwrap();
        service.process_video(Some(VIDEO), None).await.unwrap();

        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_index_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_path(dir.path(), VIDEO);
        std::fs::write(&path, b"this is not an index file at all, sorry").unwrap();

        let source = FakeSource::ok();
        let service = service(dir.path(), source.clone());
        service.process_video(Some(VIDEO), None).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(SqliteVectorStore::open(&path).is_ok());
    }

    #[tokio::test]
    async fn test_index_with_other_dimensions_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_path(dir.path(), VIDEO);
        let transcript = crate::youtube::Transcript::new(VIDEO, Vec::new());
        let stale = vec![Document::new(
            VIDEO.to_string(),
            "rust".to_string(),
            0,
            vec![1.0, 0.0, 0.0],
        )];
        SqliteVectorStore::create(&path, &transcript, "text-embedding-3-small", &stale).unwrap();

        let source = FakeSource::ok();
        let service = service(dir.path(), source.clone());
        service.process_video(Some(VIDEO), None).await.unwrap();

        assert_eq!(source.calls(), 1);
        let rebuilt = SqliteVectorStore::open(&path).unwrap();
        assert_eq!(rebuilt.embedding_dimensions().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_session_restored_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        service(dir.path(), FakeSource::ok())
            .process_video(Some(VIDEO), None)
            .await
            .unwrap();

        let source = FakeSource::ok();
        let restarted = service(dir.path(), source.clone());
        assert!(restarted.session(VIDEO).is_none());

        let answer = restarted.chat(VIDEO, "coffee?").await.unwrap();
        assert!(!answer.answer.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_chat_requires_processed_video() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), FakeSource::ok());

        let err = service.chat(VIDEO, "hello?").await.unwrap_err();
        assert!(matches!(err, TubechatError::VideoNotProcessed(_)));
        assert_eq!(
            err.to_string(),
            "Video dQw4w9WgXcQ not processed. Please process the video first."
        );

        let err = service.chat(VIDEO, "   ").await.unwrap_err();
        assert!(matches!(err, TubechatError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_model_failure_becomes_generation_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = RagService::with_components(
            settings(dir.path()),
            FakeSource::ok(),
            Arc::new(KeywordEmbedder),
            Arc::new(FailingModel),
        )
        .unwrap();
        service.process_video(Some(VIDEO), None).await.unwrap();

        let err = service.chat(VIDEO, "What about rust?").await.unwrap_err();
        assert!(matches!(err, TubechatError::Generation(_)));
        assert!(!err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Error generating answer: OpenAI API error: service unavailable"
        );
    }

    #[tokio::test]
    async fn test_transcript_failure_leaves_no_index() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), FakeSource::failing("Video unavailable"));

        let err = service.process_video(Some(VIDEO), None).await.unwrap_err();
        assert!(matches!(
            err,
            TubechatError::Transcript(TranscriptError::Unavailable { .. })
        ));
        assert!(!service.video_status(VIDEO).exists);
        assert!(service.session(VIDEO).is_none());
    }

    #[test]
    fn test_status_of_invalid_id() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), FakeSource::ok());

        let status = service.video_status("../../etc");
        assert!(!status.exists);
        assert_eq!(status.status, "not_processed");
    }
}
