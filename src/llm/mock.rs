//! Scripted chat model for tests.
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatError, ChatMessage, ChatModel};

/// Replies with a fixed answer (or a fixed failure) and records every
/// conversation it receives.
pub struct MockChat {
    reply: Result<String, u16>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChat {
    #[must_use]
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the service answered `status`.
    #[must_use]
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for MockChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(status) => Err(ChatError::Status {
                status: *status,
                body: "mock chat failure".to_string(),
            }),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
