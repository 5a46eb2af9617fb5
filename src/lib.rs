//! Credential-gated chat console with a shell command box.
//!
//! ## Secrets bootstrap
//!
//! `chat_console` reads its reference credentials from a TOML secrets file.
//! Set `CHAT_CONSOLE_SECRETS_PATH` to point at it (defaults to
//! `./secrets.toml`):
//!
//! ```toml
//! [login]
//! username = "admin"
//! password = "hunter2"
//!
//! [executor]
//! timeout_secs = 30
//!
//! [api]
//! model = "gpt-3.5-turbo"
//! ```
//!
//! Contract notes:
//! - `[login]` is required and both fields must be non-empty.
//! - `[executor].timeout_secs` is optional and must be > 0 when provided.
//! - `[api]` is optional; `base_url` targets OpenAI-compatible endpoints.
//! - Unknown TOML keys are rejected.
//!
//! The chat API key is NOT part of the secrets file: the user supplies it
//! at runtime with `/key` and it lives only in process memory.
//!
//! ## Command execution
//!
//! `/run` hands the raw line to a shell with a wall-clock timeout and no
//! sandboxing. That is an intentional capability of this console, gated
//! only by the login; do not point it at untrusted input.

pub mod app;
pub mod auth;
pub mod backend;
pub mod commands;
pub mod exec;
pub mod secrets;
