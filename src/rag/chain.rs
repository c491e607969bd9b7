//! The retrieve, prompt, and generate pipeline.

use super::{ChatModel, Retriever};
use crate::config::Prompts;
use crate::error::Result;
use crate::vector_store::SearchResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Join retrieved chunk texts into the prompt context.
pub fn format_docs(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.document.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Question answering over one video's transcript.
#[derive(Clone)]
pub struct RagChain {
    retriever: Retriever,
    llm: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl RagChain {
    pub fn new(retriever: Retriever, llm: Arc<dyn ChatModel>, prompts: Prompts) -> Self {
        Self {
            retriever,
            llm,
            prompts,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Render the answer prompt for a question and its context.
    pub fn render_prompt(&self, question: &str, context: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        self.prompts.render_with_custom(&self.prompts.rag.template, &vars)
    }

    /// Answer a question. The model output is returned unchanged.
    #[instrument(skip(self))]
    pub async fn invoke(&self, question: &str) -> Result<String> {
        let results = self.retriever.retrieve(question).await?;
        let context = format_docs(&results);
        let prompt = self.render_prompt(question, &context);

        info!("Answering with {} context chunks", results.len());
        self.llm.complete(&prompt).await
    }
}
