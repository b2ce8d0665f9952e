use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::rag::RagError;
use crate::store::StoreError;

/// Error surface of the HTTP API. Every variant renders as `{ "error": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing input field. The status is configurable to keep the
    /// historical `200 + error body` contract available.
    #[error("{message}")]
    Validation {
        message: &'static str,
        status: StatusCode,
    },
    #[error("unprocessable request: {0}")]
    Unprocessable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{message}")]
    Upstream {
        kind: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn from_rag(err: RagError, validation_status: StatusCode) -> Self {
        match err {
            RagError::Validation(message) => ApiError::Validation {
                message,
                status: validation_status,
            },
            RagError::Retrieval(StoreError::CollectionNotFound(name)) => {
                ApiError::NotFound(format!("collection not found: {name}"))
            }
            other => ApiError::Upstream {
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { message, status } => {
                (status, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": msg })),
            )
                .into_response(),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": msg, "kind": "retrieval_error" })),
            )
                .into_response(),
            ApiError::Upstream { kind, message } => (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": message, "kind": kind })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::EmbedderError;

    #[test]
    fn test_validation_keeps_configured_status() {
        let err = ApiError::from_rag(RagError::Validation("message is required"), StatusCode::OK);
        assert_eq!(err.into_response().status(), StatusCode::OK);

        let err = ApiError::from_rag(
            RagError::Validation("message is required"),
            StatusCode::BAD_REQUEST,
        );
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let err = ApiError::from_rag(
            RagError::Embedding(EmbedderError::EmptyEmbedding),
            StatusCode::OK,
        );
        assert!(matches!(
            err,
            ApiError::Upstream {
                kind: "embedding_service_error",
                ..
            }
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_missing_collection_maps_to_not_found() {
        let err = ApiError::from_rag(
            RagError::Retrieval(StoreError::CollectionNotFound("physics".to_string())),
            StatusCode::OK,
        );
        assert_eq!(err.to_string(), "not found: collection not found: physics");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
