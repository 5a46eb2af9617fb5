use chat_session::{CommandRecord, Session, RECENT_COMMAND_DISPLAY_LIMIT};
use tracing::{debug, info, warn};

use crate::auth::Credentials;
use crate::backend::{CancelSignal, ChatBackend};
use crate::exec::CommandExecutor;

pub const HELP_TEXT: &str =
    "Commands: /help, /key <api-key>, /run <command>, /history, /clear, /logout, /quit";
pub const AUTH_FAILURE_MESSAGE: &str = "Incorrect username or password.";
pub const MISSING_API_KEY_PROMPT: &str =
    "Please provide your API key with /key <api-key> to continue chatting.";
pub const EMPTY_COMMAND_WARNING: &str = "No command entered; nothing was executed.";
pub const EMPTY_HISTORY_MESSAGE: &str = "No commands executed yet.";

/// Application flow over one user's [`Session`].
///
/// The host creates one `App` per interacting user at session start; every
/// operation goes through it, and all failures come back as displayable
/// strings so the surface never has to unpack structured errors.
pub struct App {
    credentials: Credentials,
    session: Session,
    executor: CommandExecutor,
    api_key: Option<String>,
    pub should_exit: bool,
}

impl App {
    #[must_use]
    pub fn new(credentials: Credentials, executor: CommandExecutor) -> Self {
        Self {
            credentials,
            session: Session::new(),
            executor,
            api_key: None,
            should_exit: false,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Checks the candidate pair against the reference credentials and
    /// flips the session flag on success.
    pub fn try_login(&mut self, username: &str, password: &str) -> bool {
        if self.credentials.matches(username, password) {
            self.session.login();
            info!(user = username, "login succeeded");
            true
        } else {
            warn!(user = username, "login rejected");
            false
        }
    }

    /// Ends the login: chat log and API key are dropped, command history
    /// survives.
    pub fn logout(&mut self) {
        self.session.logout();
        self.api_key = None;
        info!("logged out");
    }

    /// Stores the runtime API key. Blank input clears it.
    pub fn set_api_key(&mut self, key: &str) -> String {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            self.api_key = None;
            MISSING_API_KEY_PROMPT.to_string()
        } else {
            self.api_key = Some(trimmed.to_string());
            "API key set for this session.".to_string()
        }
    }

    pub fn clear_chat(&mut self) {
        self.session.clear_messages();
        debug!("chat log cleared");
    }

    /// One chat turn: record the prompt, stream a completion over the full
    /// message log, and commit the accumulated reply. A failed dispatch
    /// rolls the prompt back out of the log.
    pub fn submit_chat(
        &mut self,
        prompt: &str,
        backend: &dyn ChatBackend,
        cancel: &CancelSignal,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<String, String> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(MISSING_API_KEY_PROMPT.to_string());
        };

        self.session
            .record_user_message(prompt)
            .map_err(|error| error.to_string())?;

        match backend.complete(&api_key, self.session.messages(), cancel, on_delta) {
            Ok(reply) => {
                self.session
                    .record_assistant_message(&reply)
                    .map_err(|error| error.to_string())?;
                debug!(chars = reply.len(), "chat turn completed");
                Ok(reply)
            }
            Err(error) => {
                self.session.rollback_user_message_if_matches(prompt);
                warn!(%error, "chat turn failed");
                Err(error)
            }
        }
    }

    /// One command turn: execute through the shell and append the report
    /// to the history. Empty submissions are warned about, not executed.
    pub fn run_command(&mut self, command: &str) -> Result<String, String> {
        let command = command.trim();
        if command.is_empty() {
            return Err(EMPTY_COMMAND_WARNING.to_string());
        }
        if !self.session.is_authenticated() {
            return Err("Command execution requires login.".to_string());
        }

        debug!(command, "executing shell command");
        let report = self.executor.execute(command, None);
        self.session
            .record_command(CommandRecord::new(command, &report))
            .map_err(|error| error.to_string())?;

        Ok(report)
    }

    /// Renders the history view: at most 5 entries, newest first.
    #[must_use]
    pub fn render_history(&self) -> String {
        let recent = self.session.recent_commands(RECENT_COMMAND_DISPLAY_LIMIT);
        if recent.is_empty() {
            return EMPTY_HISTORY_MESSAGE.to_string();
        }

        let mut rendered = String::new();
        for (index, record) in recent.iter().enumerate() {
            if index > 0 {
                rendered.push('\n');
            }
            rendered.push_str(&format!("$ {}\n{}", record.command, record.report));
        }
        rendered
    }
}
