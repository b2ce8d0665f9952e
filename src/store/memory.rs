//! In-process vector store.
//!
//! Collections are fixed at construction time; queries rank by cosine
//! similarity. There is no mutation after build, so the store is shared
//! freely between concurrent requests.
use std::collections::HashMap;

use async_trait::async_trait;

use super::{StoreError, VectorStore};

#[derive(Debug, Clone)]
struct Entry {
    embedding: Vec<f32>,
    document: String,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or extend) a collection with `(embedding, document)` pairs.
    #[must_use]
    pub fn with_collection<I, S>(mut self, name: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (Vec<f32>, S)>,
        S: Into<String>,
    {
        let collection = self.collections.entry(name.to_string()).or_default();
        collection.extend(entries.into_iter().map(|(embedding, document)| Entry {
            embedding,
            document: document.into(),
        }));
        self
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return f32::MIN;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<String>, StoreError> {
        let entries = self
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        let mut scored: Vec<(f32, &Entry)> = entries
            .iter()
            .map(|e| (cosine_similarity(embedding, &e.embedding), e))
            .collect();
        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(n_results)
            .map(|(_, e)| e.document.clone())
            .collect())
    }
}
