use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_console::app::{App, EMPTY_COMMAND_WARNING, MISSING_API_KEY_PROMPT};
use chat_console::auth::Credentials;
use chat_console::backend::{CancelSignal, ChatBackend, MockChatBackend};
use chat_console::exec::CommandExecutor;
use chat_session::{ChatMessage, ChatRole};

fn logged_in_app() -> App {
    let mut app = App::new(Credentials::new("admin", "hunter2"), CommandExecutor::new());
    assert!(app.try_login("admin", "hunter2"));
    app
}

fn fresh_cancel() -> CancelSignal {
    Arc::new(AtomicBool::new(false))
}

struct FailingBackend;

impl ChatBackend for FailingBackend {
    fn complete(
        &self,
        _api_key: &str,
        _messages: &[ChatMessage],
        _cancel: &CancelSignal,
        _on_delta: &mut dyn FnMut(&str),
    ) -> Result<String, String> {
        Err("chat request failed: HTTP 500 boom".to_string())
    }
}

#[test]
fn wrong_credentials_do_not_authenticate() {
    let mut app = App::new(Credentials::new("admin", "hunter2"), CommandExecutor::new());

    assert!(!app.try_login("admin", "Hunter2"));
    assert!(!app.try_login("root", "hunter2"));
    assert!(!app.is_authenticated());

    assert!(app.try_login("admin", "hunter2"));
    assert!(app.is_authenticated());
}

#[test]
fn chat_without_api_key_is_blocked_before_recording_anything() {
    let mut app = logged_in_app();
    let backend = MockChatBackend::default();

    let result = app.submit_chat("hello", &backend, &fresh_cancel(), &mut |_| {});

    assert_eq!(result, Err(MISSING_API_KEY_PROMPT.to_string()));
    assert!(app.session().messages().is_empty());
}

#[test]
fn chat_turn_streams_deltas_and_commits_both_messages() {
    let mut app = logged_in_app();
    app.set_api_key("sk-test");
    let backend = MockChatBackend::new(vec!["Hel".to_string(), "lo!".to_string()]);

    let mut streamed = String::new();
    let reply = app
        .submit_chat("hi there", &backend, &fresh_cancel(), &mut |delta| {
            streamed.push_str(delta);
        })
        .expect("mock chat turn should succeed");

    assert_eq!(reply, "Hello!");
    assert_eq!(streamed, reply);

    let messages = app.session().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], ChatMessage::user("hi there"));
    assert_eq!(messages[1].role, ChatRole::Assistant);
    assert_eq!(messages[1].content, "Hello!");
}

#[test]
fn failed_chat_turn_rolls_the_prompt_back_out_of_the_log() {
    let mut app = logged_in_app();
    app.set_api_key("sk-test");

    let result = app.submit_chat("hello", &FailingBackend, &fresh_cancel(), &mut |_| {});

    assert!(result.is_err());
    assert!(app.session().messages().is_empty());
}

#[test]
fn cancelled_mock_backend_reports_cancellation() {
    let mut app = logged_in_app();
    app.set_api_key("sk-test");
    let backend = MockChatBackend::default();

    let cancel = fresh_cancel();
    cancel.store(true, Ordering::Release);
    let result = app.submit_chat("hello", &backend, &cancel, &mut |_| {});

    assert_eq!(result, Err("chat request was cancelled".to_string()));
    assert!(app.session().messages().is_empty());
}

#[test]
fn empty_command_submission_warns_without_executing() {
    let mut app = logged_in_app();

    assert_eq!(
        app.run_command("   "),
        Err(EMPTY_COMMAND_WARNING.to_string())
    );
    assert!(app.session().command_history().is_empty());
}

#[test]
fn command_execution_requires_login() {
    let mut app = App::new(Credentials::new("admin", "hunter2"), CommandExecutor::new());

    let result = app.run_command("echo hi");
    assert_eq!(result, Err("Command execution requires login.".to_string()));
}

#[test]
fn executed_commands_are_appended_to_history_with_their_reports() {
    let mut app = logged_in_app();

    let report = app.run_command("echo marker-1").expect("echo should run");
    assert!(report.contains("marker-1"));

    let history = app.session().command_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].command, "echo marker-1");
    assert_eq!(history[0].report, report);
}

#[test]
fn history_view_shows_five_newest_entries_first() {
    let mut app = logged_in_app();
    for index in 0..7 {
        app.run_command(&format!("echo marker-{index}"))
            .expect("echo should run");
    }

    let rendered = app.render_history();
    assert!(rendered.contains("$ echo marker-6"));
    assert!(rendered.contains("$ echo marker-2"));
    assert!(!rendered.contains("$ echo marker-1"));
    assert!(!rendered.contains("$ echo marker-0"));

    let newest = rendered.find("$ echo marker-6").expect("newest entry");
    let oldest_shown = rendered.find("$ echo marker-2").expect("oldest shown entry");
    assert!(newest < oldest_shown, "{rendered}");
}

#[test]
fn logout_drops_chat_log_and_api_key_but_keeps_history() {
    let mut app = logged_in_app();
    app.set_api_key("sk-test");
    let backend = MockChatBackend::default();
    app.submit_chat("hello", &backend, &fresh_cancel(), &mut |_| {})
        .expect("mock chat turn should succeed");
    app.run_command("true").expect("true should run");

    app.logout();

    assert!(!app.is_authenticated());
    assert!(!app.has_api_key());
    assert!(app.session().messages().is_empty());
    assert_eq!(app.session().command_history().len(), 1);
}
