/// Mock embedder for testing purposes.
///
/// Generates deterministic embeddings based on text hash and records
/// every text it was asked to embed.
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Embedder, EmbedderError};

/// A mock embedder that produces deterministic vectors from text hashes.
///
/// Useful for exercising the pipeline without a running Ollama.
pub struct MockEmbedder {
    pub dimensions: usize,
    fail_with_status: Option<u16>,
    calls: Mutex<Vec<String>>,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail_with_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An embedder whose every call fails as if the service answered `status`.
    #[must_use]
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::default()
        }
    }

    /// Texts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Deterministic vector for `text`, identical to what `embed` returns.
    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        // Use the hash bytes to seed deterministic float values
        let bytes = hash.to_le_bytes();
        let mut embedding: Vec<f32> = (0..self.dimensions)
            .map(|i| f32::from(bytes[i % 8]) / 255.0)
            .collect();

        // L2 normalize
        let norm_sq: f32 = embedding.iter().map(|v| v * v).sum();
        if norm_sq > 0.0 {
            let inv = 1.0 / norm_sq.sqrt();
            for v in &mut embedding {
                *v *= inv;
            }
        }
        embedding
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(768)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }

        if let Some(status) = self.fail_with_status {
            return Err(EmbedderError::Status {
                status,
                body: "mock embedder failure".to_string(),
            });
        }

        Ok(self.vector_for(text))
    }

    fn model(&self) -> &str {
        "mock"
    }
}
