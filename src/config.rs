/// Configuration module for ragbridge.
///
/// Handles loading, validating, and providing default configuration values.
/// Sources are layered: JSON file, then `.env` / process environment, then CLI flags.
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

// ── Default value functions ──────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_chat_model() -> String {
    "gpt-oss:20b".to_string()
}

fn default_chroma_url() -> String {
    "https://api.trychroma.com".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_system_prompt() -> String {
    "Eres un asistente útil. Responde SIEMPRE en español.".to_string()
}

fn default_prompt_template() -> String {
    "\nResponde usando principalmente el contexto proporcionado.\n\
     Si no encuentras información suficiente, indícalo claramente.\n\
     \n\
     Contexto:\n\
     {context}\n\
     \n\
     Pregunta:\n\
     {question}\n"
        .to_string()
}

fn default_fallback_answer() -> String {
    "No encontré información relevante en la base de datos.".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub chroma: ChromaConfig,

    #[serde(default)]
    pub rag: RagConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `"*"` allows every origin; anything else is an explicit allow-list.
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_true")]
    pub cors_allow_credentials: bool,

    /// HTTP status used for `{ "error": ... }` validation replies.
    #[serde(default)]
    pub validation_error_status: ValidationStatus,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// 200, matching the historical contract of the endpoint.
    #[default]
    Ok,
    /// 400.
    BadRequest,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChromaConfig {
    #[serde(default = "default_chroma_url")]
    pub base_url: String,

    #[serde(default)]
    pub tenant: String,

    #[serde(default)]
    pub database: String,

    /// Read from `CHROMA_API_KEY`; never written back to disk.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RagConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Must contain both `{context}` and `{question}`.
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    #[serde(default = "default_fallback_answer")]
    pub fallback_answer: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_cors_origins(),
            cors_allow_credentials: default_true(),
            validation_error_status: ValidationStatus::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
        }
    }
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            base_url: default_chroma_url(),
            tenant: String::new(),
            database: String::new(),
            api_key: None,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            system_prompt: default_system_prompt(),
            prompt_template: default_prompt_template(),
            fallback_answer: default_fallback_answer(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and, for the
    /// default path only, writes a template file next to the binary's cwd.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file. The Chroma API key is omitted.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Overlay values from the process environment.
    ///
    /// Call after `dotenvy::dotenv()` so `.env` entries are visible.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("CHROMA_API_KEY") {
            self.chroma.api_key = Some(v);
        }
        if let Some(v) = get("CHROMA_TENANT") {
            self.chroma.tenant = v;
        }
        if let Some(v) = get("CHROMA_DATABASE") {
            self.chroma.database = v;
        }
        if let Some(v) = get("CHROMA_URL") {
            self.chroma.base_url = v;
        }
        if let Some(v) = get("OLLAMA_BASE_URL") {
            self.ollama.base_url = v;
        }
        if let Some(v) = get("OLLAMA_EMBED_MODEL") {
            self.ollama.embedding_model = v;
        }
        if let Some(v) = get("OLLAMA_CHAT_MODEL") {
            self.ollama.chat_model = v;
        }
        if let Some(v) = get("RAG_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("RAG_PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!("Ignoring invalid RAG_PORT {v:?}: {e}"),
            }
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.rag.top_k > 0, "rag.top_k must be positive");
        anyhow::ensure!(
            !self.ollama.base_url.trim().is_empty(),
            "ollama.base_url must not be empty"
        );
        anyhow::ensure!(
            !self.ollama.embedding_model.trim().is_empty(),
            "ollama.embedding_model must not be empty"
        );
        anyhow::ensure!(
            !self.ollama.chat_model.trim().is_empty(),
            "ollama.chat_model must not be empty"
        );
        anyhow::ensure!(
            !self.chroma.base_url.trim().is_empty(),
            "chroma.base_url must not be empty"
        );
        anyhow::ensure!(
            !self.chroma.tenant.trim().is_empty(),
            "chroma.tenant is required (set CHROMA_TENANT)"
        );
        anyhow::ensure!(
            !self.chroma.database.trim().is_empty(),
            "chroma.database is required (set CHROMA_DATABASE)"
        );
        anyhow::ensure!(
            self.rag.prompt_template.contains(CONTEXT_PLACEHOLDER),
            "rag.prompt_template must contain {CONTEXT_PLACEHOLDER}"
        );
        anyhow::ensure!(
            self.rag.prompt_template.contains(QUESTION_PLACEHOLDER),
            "rag.prompt_template must contain {QUESTION_PLACEHOLDER}"
        );
        anyhow::ensure!(
            !self.server.cors_allowed_origins.is_empty(),
            "server.cors_allowed_origins must list at least one origin (or \"*\")"
        );
        Ok(())
    }

    /// `host:port` string for the listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
