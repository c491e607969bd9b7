//! Similarity retrieval over a video's index.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Returns the `k` chunks most similar to a question.
#[derive(Clone)]
pub struct Retriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self {
            vector_store,
            embedder,
            k,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Embed the query and search the index.
    #[instrument(skip(self), fields(k = self.k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        let results = self.vector_store.search(&query_embedding, self.k).await?;
        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }
}
