//! Chroma client over the v2 REST API.
//!
//! Works against Chroma Cloud (`https://api.trychroma.com`) and self-hosted
//! servers alike. Each query resolves the collection by name and then issues
//! the nearest-neighbour query; no collection ids are cached between requests.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{StoreError, VectorStore};

const TOKEN_HEADER: &str = "x-chroma-token";

#[derive(Debug, Deserialize)]
struct CollectionModel {
    id: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: [&'a [f32]; 1],
    n_results: usize,
    include: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Option<Vec<Option<Vec<Option<String>>>>>,
}

impl QueryResponse {
    /// Documents of the first (and only) query, skipping null entries.
    fn into_first_documents(self) -> Vec<String> {
        self.documents
            .and_then(|lists| lists.into_iter().next())
            .flatten()
            .map(|docs| docs.into_iter().flatten().collect())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct ChromaStore {
    client: reqwest::Client,
    base_url: String,
    tenant: String,
    database: String,
    api_key: Option<String>,
}

impl ChromaStore {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        tenant: &str,
        database: &str,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tenant: tenant.to_string(),
            database: database.to_string(),
            api_key,
        }
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url,
            urlencoding::encode(&self.tenant),
            urlencoding::encode(&self.database),
        )
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(TOKEN_HEADER, key),
            None => req,
        }
    }

    /// Resolve a collection name to its id.
    async fn collection_id(&self, name: &str) -> Result<String, StoreError> {
        let url = format!("{}/{}", self.collections_url(), urlencoding::encode(name));
        let response = self.authorized(self.client.get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND || body.contains("does not exist") {
                return Err(StoreError::CollectionNotFound(name.to_string()));
            }
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let collection: CollectionModel = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(collection.id)
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<String>, StoreError> {
        let id = self.collection_id(collection).await?;
        debug!(collection, id = %id, "resolved collection");

        let url = format!("{}/{}/query", self.collections_url(), urlencoding::encode(&id));
        let request = QueryRequest {
            query_embeddings: [embedding],
            n_results,
            include: ["documents"],
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(parsed.into_first_documents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COLLECTIONS: &str = "/api/v2/tenants/acme/databases/kb/collections";

    fn store(uri: &str, api_key: Option<&str>) -> ChromaStore {
        ChromaStore::new(
            reqwest::Client::new(),
            uri,
            "acme",
            "kb",
            api_key.map(str::to_string),
        )
    }

    async fn mount_collection(server: &MockServer, name: &str, id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("{COLLECTIONS}/{name}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": id, "name": name})),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_first_documents_skips_nulls() {
        let parsed: QueryResponse = serde_json::from_value(serde_json::json!({
            "ids": [["a", "b", "c"]],
            "documents": [["Doc A", null, "Doc C"]]
        }))
        .unwrap();
        assert_eq!(parsed.into_first_documents(), vec!["Doc A", "Doc C"]);
    }

    #[test]
    fn test_first_documents_absent() {
        let parsed: QueryResponse =
            serde_json::from_value(serde_json::json!({"ids": [[]], "documents": null})).unwrap();
        assert!(parsed.into_first_documents().is_empty());

        let parsed: QueryResponse =
            serde_json::from_value(serde_json::json!({"documents": []})).unwrap();
        assert!(parsed.into_first_documents().is_empty());
    }

    #[test]
    fn test_path_segments_encoded() {
        let s = ChromaStore::new(reqwest::Client::new(), "http://h/", "my tenant", "db/1", None);
        assert_eq!(
            s.collections_url(),
            "http://h/api/v2/tenants/my%20tenant/databases/db%2F1/collections"
        );
    }

    #[tokio::test]
    async fn test_query_returns_ranked_documents() {
        let server = MockServer::start().await;
        mount_collection(&server, "biology", "c-123").await;

        Mock::given(method("POST"))
            .and(path(format!("{COLLECTIONS}/c-123/query")))
            .and(header(TOKEN_HEADER, "ck-test"))
            .and(body_json(serde_json::json!({
                "query_embeddings": [[0.5, 0.25]],
                "n_results": 5,
                "include": ["documents"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ids": [["1", "2"]],
                "documents": [["Doc A", "Doc B"]],
                "distances": [[0.1, 0.2]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let docs = store(&server.uri(), Some("ck-test"))
            .query("biology", &[0.5, 0.25], 5)
            .await
            .unwrap();
        assert_eq!(docs, vec!["Doc A", "Doc B"]);
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{COLLECTIONS}/nope")))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "NotFoundError",
                "message": "Collection [nope] does not exist"
            })))
            .mount(&server)
            .await;

        let err = store(&server.uri(), None)
            .query("nope", &[0.1], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_query_server_error() {
        let server = MockServer::start().await;
        mount_collection(&server, "biology", "c-123").await;
        Mock::given(method("POST"))
            .and(path(format!("{COLLECTIONS}/c-123/query")))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = store(&server.uri(), None)
            .query("biology", &[0.1], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{COLLECTIONS}/biology")))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let err = store(&server.uri(), Some("wrong"))
            .query("biology", &[0.1], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 401, .. }));
    }
}
