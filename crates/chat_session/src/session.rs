use crate::error::SessionError;
use crate::schema::{ChatMessage, CommandRecord};

/// How many command-history entries the display surface shows.
pub const RECENT_COMMAND_DISPLAY_LIMIT: usize = 5;

/// Mutable per-user state scoped to one interacting user's lifetime.
///
/// Created once by the host at session start and passed to every
/// operation; there is no process-wide singleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
    messages: Vec<ChatMessage>,
    command_history: Vec<CommandRecord>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn login(&mut self) {
        self.authenticated = true;
    }

    /// Clears the auth flag and the chat log. The command history is
    /// intentionally retained across logins.
    pub fn logout(&mut self) {
        self.authenticated = false;
        self.messages.clear();
    }

    /// Clears the chat log without touching the auth flag or history.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn command_history(&self) -> &[CommandRecord] {
        &self.command_history
    }

    pub fn record_user_message(&mut self, content: impl Into<String>) -> Result<(), SessionError> {
        self.require_login("recording a user message")?;
        self.messages.push(ChatMessage::user(content));
        Ok(())
    }

    pub fn record_assistant_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.require_login("recording an assistant message")?;
        self.messages.push(ChatMessage::assistant(content));
        Ok(())
    }

    /// Drops the most recent user message when it matches `content`.
    ///
    /// Used by the host to roll back a submitted chat turn whose dispatch
    /// failed, so the log never contains a user message with no response
    /// attempt behind it.
    pub fn rollback_user_message_if_matches(&mut self, content: &str) {
        if self
            .messages
            .last()
            .is_some_and(|message| message == &ChatMessage::user(content))
        {
            self.messages.pop();
        }
    }

    pub fn record_command(&mut self, record: CommandRecord) -> Result<(), SessionError> {
        self.require_login("recording a command")?;
        self.command_history.push(record);
        Ok(())
    }

    /// The display view of the command history: at most `limit` entries,
    /// newest first.
    #[must_use]
    pub fn recent_commands(&self, limit: usize) -> Vec<&CommandRecord> {
        self.command_history.iter().rev().take(limit).collect()
    }

    fn require_login(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.authenticated {
            Ok(())
        } else {
            Err(SessionError::not_authenticated(operation))
        }
    }
}
