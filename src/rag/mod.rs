//! RAG (Retrieval-Augmented Generation) for answering questions about a video.

mod chain;
mod llm;
mod retriever;

pub use chain::{format_docs, RagChain};
pub use llm::{ChatModel, OpenAIChatModel};
pub use retriever::Retriever;
