//! Vector store abstraction.
//!
//! A store answers one question: given a collection name and a query
//! embedding, which documents are nearest? Results come back in rank order.
pub mod chroma;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("vector store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vector store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid vector store response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return the documents of the nearest `n_results` entries in `collection`,
    /// most similar first. An empty vector means nothing matched.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<String>, StoreError>;
}
