//! HTTP surface: `POST /chat`, `GET /health`.
pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{ServerConfig, ValidationStatus};
use crate::rag::RagHandler;

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<RagHandler>,
    pub validation_status: StatusCode,
}

impl AppState {
    pub fn new(handler: Arc<RagHandler>, server: &ServerConfig) -> Self {
        let validation_status = match server.validation_error_status {
            ValidationStatus::Ok => StatusCode::OK,
            ValidationStatus::BadRequest => StatusCode::BAD_REQUEST,
        };
        Self {
            handler,
            validation_status,
        }
    }
}

/// Build the application router with CORS and request tracing.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(build_cors_layer(server))
        .layer(TraceLayer::new_for_http())
}

/// `"*"` opens the API to every origin. With credentials enabled the
/// request's origin, method and headers are mirrored back, since a literal
/// wildcard is rejected by browsers (and by tower-http) in that mode.
fn build_cors_layer(server: &ServerConfig) -> CorsLayer {
    let wildcard = server.cors_allowed_origins.iter().any(|o| o.trim() == "*");

    if wildcard && !server.cors_allow_credentials {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allow_origin = if wildcard {
        AllowOrigin::mirror_request()
    } else {
        let origins = server
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                    None
                }
            })
            .collect::<Vec<_>>();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(server.cors_allow_credentials)
}

/// Serve until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
