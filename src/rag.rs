//! Retrieval-augmented answer pipeline.
//!
//! `validate → embed → retrieve → (fallback | complete)`. Each stage either
//! succeeds or aborts the request; there are no retries and no partial answers.
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::RagConfig;
use crate::embedder::{Embedder, EmbedderError};
use crate::llm::{ChatError, ChatModel};
use crate::prompt;
use crate::store::{StoreError, VectorStore};

pub const MESSAGE_REQUIRED: &str = "message is required";
pub const COLLECTION_REQUIRED: &str = "collection is required";

#[derive(Error, Debug)]
pub enum RagError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("embedding service error: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] StoreError),

    #[error("completion service error: {0}")]
    Completion(#[from] ChatError),
}

impl RagError {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::Validation(_) => "validation_error",
            RagError::Embedding(_) => "embedding_service_error",
            RagError::Retrieval(_) => "retrieval_error",
            RagError::Completion(_) => "completion_service_error",
        }
    }
}

/// Owns the three collaborators and the prompt settings. Immutable after
/// construction; one instance serves all concurrent requests.
pub struct RagHandler {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatModel>,
    settings: RagConfig,
}

impl RagHandler {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
        settings: RagConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            chat,
            settings,
        }
    }

    pub fn settings(&self) -> &RagConfig {
        &self.settings
    }

    /// Answer `message` using documents retrieved from `collection`.
    ///
    /// An empty retrieval is a successful outcome and yields the configured
    /// fallback answer without calling the chat model.
    #[instrument(skip(self, message), fields(message_len = message.len()))]
    pub async fn handle(&self, message: &str, collection: &str) -> Result<String, RagError> {
        if message.is_empty() {
            return Err(RagError::Validation(MESSAGE_REQUIRED));
        }
        if collection.is_empty() {
            return Err(RagError::Validation(COLLECTION_REQUIRED));
        }

        debug!(model = self.embedder.model(), "embedding query");
        let embedding = self.embedder.embed(message).await.inspect_err(|e| {
            warn!("embedding failed: {e}");
        })?;

        debug!(top_k = self.settings.top_k, "querying vector store");
        let documents = self
            .store
            .query(collection, &embedding, self.settings.top_k)
            .await
            .inspect_err(|e| warn!("retrieval failed: {e}"))?;

        let Some(context) = prompt::build_context(&documents) else {
            info!("no documents retrieved, returning fallback answer");
            return Ok(self.settings.fallback_answer.clone());
        };

        let user_prompt = prompt::render_prompt(&self.settings.prompt_template, &context, message);
        let messages = prompt::build_messages(&self.settings.system_prompt, user_prompt);

        debug!(model = self.chat.model(), "requesting completion");
        let answer = self
            .chat
            .complete(&messages)
            .await
            .inspect_err(|e| warn!("completion failed: {e}"))?;

        info!(documents = documents.len(), "answer generated");
        Ok(answer)
    }
}
