use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ragbridge::config::Config;
use ragbridge::embedder::ollama::OllamaEmbedder;
use ragbridge::llm::ollama::OllamaChat;
use ragbridge::rag::RagHandler;
use ragbridge::server::{self, AppState};
use ragbridge::store::chroma::ChromaStore;

#[derive(Parser, Debug)]
#[command(version, about = "Retrieval-augmented chat endpoint backed by Ollama and Chroma")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Listen address (overrides config and RAG_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides config and RAG_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_file = dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    tracing::info!("Starting ragbridge v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = env_file {
        tracing::info!("Loaded environment from {}", path.display());
    }

    // 1. Load config
    let mut config = Config::load(&cli.config)?;
    config.apply_env();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate().context("Invalid configuration")?;

    // 2. Build upstream clients (one shared connection pool)
    let http = reqwest::Client::builder()
        .user_agent(concat!("ragbridge/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let embedder = Arc::new(OllamaEmbedder::new(
        http.clone(),
        &config.ollama.base_url,
        &config.ollama.embedding_model,
    ));
    let store = Arc::new(ChromaStore::new(
        http.clone(),
        &config.chroma.base_url,
        &config.chroma.tenant,
        &config.chroma.database,
        config.chroma.api_key.clone(),
    ));
    let chat = Arc::new(OllamaChat::new(
        http,
        &config.ollama.base_url,
        &config.ollama.chat_model,
    ));
    if config.chroma.api_key.is_none() {
        tracing::warn!("CHROMA_API_KEY is not set; requests to Chroma are unauthenticated");
    }

    // 3. Wire handler + router
    let handler = Arc::new(RagHandler::new(embedder, store, chat, config.rag.clone()));
    let state = AppState::new(handler, &config.server);
    let app = server::router(state, &config.server);

    // 4. Serve
    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;
    server::serve(listener, app).await
}
