use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Captured streams and exit status of a completed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

/// Explicit outcome of one command invocation. The caller decides how to
/// render it; [`render_report`] is the canonical text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed(CommandResult),
    TimedOut { timeout_secs: u64 },
    Launch(String),
}

/// Runs arbitrary command lines through a shell with a wall-clock timeout.
///
/// No validation, no allow-list, no escaping: the command string reaches
/// the shell exactly as submitted, with the privileges of this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExecutor {
    default_timeout_secs: u64,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout_secs: u64) -> Self {
        self.default_timeout_secs = timeout_secs;
        self
    }

    #[must_use]
    pub fn default_timeout_secs(&self) -> u64 {
        self.default_timeout_secs
    }

    /// Launches `command` through `sh -c`, waits up to the timeout, and
    /// returns the explicit outcome. A timed-out child is killed and
    /// reaped before returning.
    pub fn run(&self, command: &str, timeout_secs: Option<u64>) -> CommandOutcome {
        let timeout = timeout_secs.unwrap_or(self.default_timeout_secs);

        let mut child = match Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(error) => {
                return CommandOutcome::Launch(format!("failed to launch shell command: {error}"));
            }
        };

        // Drain both pipes on their own threads before waiting: a child
        // that writes more than one pipe buffer would otherwise block on
        // the full pipe, never exit, and get reported as a timeout.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let status = match child.wait_timeout(Duration::from_secs(timeout)) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return CommandOutcome::TimedOut {
                    timeout_secs: timeout,
                };
            }
            Err(error) => {
                let _ = child.kill();
                let _ = child.wait();
                return CommandOutcome::Launch(format!(
                    "failed waiting for shell command: {error}"
                ));
            }
        };

        let stdout = join_pipe_reader(stdout_reader);
        let stderr = join_pipe_reader(stderr_reader);

        CommandOutcome::Completed(CommandResult {
            stdout,
            stderr,
            exit_code: status.code(),
            timed_out: false,
        })
    }

    /// Text-level contract: run the command and render the report. Every
    /// failure mode comes back as displayable text, never as an error.
    pub fn execute(&self, command: &str, timeout_secs: Option<u64>) -> String {
        render_report(&self.run(command, timeout_secs))
    }
}

/// Canonical human-readable command report.
///
/// Completed commands list the non-empty streams under "output:" and
/// "error:" labels, fall back to a no-output line when both are empty,
/// and always end with the exit code on its own line. The timeout message
/// derives from the configured timeout rather than a fixed constant.
#[must_use]
pub fn render_report(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Completed(result) => {
            let mut report = String::new();

            if !result.stdout.is_empty() {
                report.push_str("output:\n");
                push_section(&mut report, &result.stdout);
            }
            if !result.stderr.is_empty() {
                report.push_str("error:\n");
                push_section(&mut report, &result.stderr);
            }
            if result.stdout.is_empty() && result.stderr.is_empty() {
                report.push_str("command completed, no output\n");
            }

            report.push_str(&format_exit_line(result.exit_code));
            report
        }
        CommandOutcome::TimedOut { timeout_secs } => {
            let unit = if *timeout_secs == 1 { "second" } else { "seconds" };
            format!("Error: command timed out after {timeout_secs} {unit}")
        }
        CommandOutcome::Launch(message) => {
            format!("Error: failed to execute command: {message}")
        }
    }
}

fn push_section(report: &mut String, text: &str) {
    report.push_str(text);
    if !text.ends_with('\n') {
        report.push('\n');
    }
}

fn format_exit_line(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code: {code}"),
        None => "exit code: terminated by signal".to_string(),
    }
}

fn spawn_pipe_reader<R>(pipe: Option<R>) -> thread::JoinHandle<String>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let Some(mut pipe) = pipe else {
            return String::new();
        };

        let mut bytes = Vec::new();
        let _ = pipe.read_to_end(&mut bytes);
        String::from_utf8_lossy(&bytes).into_owned()
    })
}

fn join_pipe_reader(reader: thread::JoinHandle<String>) -> String {
    reader.join().unwrap_or_default()
}
