//! Per-user session state for the chat console.
//!
//! A [`Session`] holds everything one interacting user accumulates over a
//! process lifetime: the authentication flag, the ordered chat message log,
//! and the append-only command history. The host owns exactly one session
//! per user and keeps it across turns; there is no persistence and no
//! cross-session sharing.
//!
//! Logout clears the chat log but deliberately leaves the command history
//! in place: the history is an audit trail of what this process executed,
//! while the chat log is per-login conversational context.

pub mod error;
pub mod schema;
pub mod session;

pub use error::SessionError;
pub use schema::{ChatMessage, ChatRole, CommandRecord};
pub use session::{Session, RECENT_COMMAND_DISPLAY_LIMIT};
