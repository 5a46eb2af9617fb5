//! Transport-only chat completions client primitives.
//!
//! This crate owns request building, response parsing, and stream
//! normalization for OpenAI-compatible `/v1/chat/completions` endpoints.
//! It intentionally contains no session state, no credential handling, and
//! no UI coupling; the API key arrives through [`ChatApiConfig`] and is
//! never persisted here.
//!
//! SSE normalization maps `chat.completion.chunk` frames into
//! [`ChatStreamEvent`] values, preserving error frames for explicit
//! caller-side failure handling.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod sse;
pub mod url;

pub use client::ChatApiClient;
pub use client::StreamResult;
pub use config::ChatApiConfig;
pub use error::ChatApiError;
pub use events::{ChatEventAccumulator, ChatFinishReason, ChatStreamEvent};
pub use payload::{ChatMessage, ChatRequest, ChatRole};
pub use sse::SseStreamParser;
pub use url::normalize_chat_url;
