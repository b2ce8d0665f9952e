/// Ollama embeddings client (`POST /api/embeddings`).
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, EmbedderError};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embeds text through a local Ollama instance.
///
/// Holds only a `reqwest::Client` (internally reference counted) and
/// immutable settings, so one instance is shared across requests.
#[derive(Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    /// * `base_url` - Ollama endpoint, e.g. `http://localhost:11434`
    /// * `model` - embedding model name, e.g. `nomic-embed-text`
    pub fn new(client: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedderError::InvalidResponse(e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(EmbedderError::EmptyEmbedding);
        }

        debug!(
            model = %self.model,
            dimensions = parsed.embedding.len(),
            "query embedded"
        );
        Ok(parsed.embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_trailing_slash_trimmed() {
        let embedder = OllamaEmbedder::new(
            reqwest::Client::new(),
            "http://localhost:11434/",
            "nomic-embed-text",
        );
        assert_eq!(embedder.base_url, "http://localhost:11434");
        assert_eq!(embedder.model(), "nomic-embed-text");
    }

    #[tokio::test]
    async fn test_embed_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_json(serde_json::json!({
                "model": "nomic-embed-text",
                "prompt": "hola"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embedding": [0.1, 0.2, 0.3]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(reqwest::Client::new(), &server.uri(), "nomic-embed-text");
        let vector = embedder.embed("hola").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(reqwest::Client::new(), &server.uri(), "missing");
        match embedder.embed("hola").await {
            Err(EmbedderError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "model not found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embed_empty_vector_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"embedding": []})),
            )
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(reqwest::Client::new(), &server.uri(), "nomic-embed-text");
        assert!(matches!(
            embedder.embed("hola").await,
            Err(EmbedderError::EmptyEmbedding)
        ));
    }

    #[tokio::test]
    async fn test_embed_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(reqwest::Client::new(), &server.uri(), "nomic-embed-text");
        assert!(matches!(
            embedder.embed("hola").await,
            Err(EmbedderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_embed_transport_failure() {
        // Nothing listens on port 9 (discard) in the test environment.
        let embedder =
            OllamaEmbedder::new(reqwest::Client::new(), "http://127.0.0.1:9", "nomic-embed-text");
        assert!(matches!(
            embedder.embed("hola").await,
            Err(EmbedderError::Request(_))
        ));
    }
}
