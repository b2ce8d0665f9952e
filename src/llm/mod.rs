//! Chat-completion abstraction.
pub mod mock;
pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("chat service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid chat response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation and return the assistant's reply verbatim.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;

    fn model(&self) -> &str;
}
