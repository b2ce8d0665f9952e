//! # ragbridge — retrieval-augmented chat endpoint
//!
//! Accepts a question and a collection name, retrieves the nearest passages
//! from a vector store, and asks a chat model to answer from that context.
//!
//! ## Architecture
//!
//! - **[`config`]** — JSON file, `.env`/environment overrides, validation
//! - **[`embedder`]** — Query embedding via Ollama (`/api/embeddings`)
//! - **[`store`]** — Vector retrieval (Chroma v2 REST API, in-memory store)
//! - **[`llm`]** — Chat completion via Ollama (`/api/chat`, non-streaming)
//! - **[`prompt`]** — Context joining and prompt template rendering
//! - **[`rag`]** — The embed → retrieve → complete pipeline and its error taxonomy
//! - **[`server`]** — axum router, CORS, error-to-HTTP mapping

pub mod config;
pub mod embedder;
pub mod llm;
pub mod prompt;
pub mod rag;
pub mod server;
pub mod store;
