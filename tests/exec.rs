use std::time::{Duration, Instant};

use chat_console::exec::{render_report, CommandExecutor, CommandOutcome, CommandResult};

#[test]
fn echo_reports_output_section_and_zero_exit() {
    let executor = CommandExecutor::new();
    let report = executor.execute("echo hello", None);

    assert!(report.starts_with("output:\n"), "{report}");
    assert!(report.contains("hello"), "{report}");
    assert_eq!(report.lines().last(), Some("exit code: 0"));
}

#[test]
fn failing_command_reports_error_section_and_nonzero_exit() {
    let executor = CommandExecutor::new();
    let report = executor.execute("ls /nonexistent-path-xyz", None);

    assert!(report.contains("error:\n"), "{report}");
    let last = report.lines().last().unwrap_or_default();
    assert!(last.starts_with("exit code: "), "{report}");
    assert_ne!(last, "exit code: 0", "{report}");
}

#[test]
fn silent_command_reports_no_output_fallback() {
    let executor = CommandExecutor::new();
    let report = executor.execute("true", None);

    assert!(report.contains("command completed, no output"), "{report}");
    assert_eq!(report.lines().last(), Some("exit code: 0"));
}

#[test]
fn output_section_precedes_error_section() {
    let executor = CommandExecutor::new();
    let report = executor.execute("echo out; echo err 1>&2; exit 3", None);

    let output_at = report.find("output:").expect("output section");
    let error_at = report.find("error:").expect("error section");
    assert!(output_at < error_at, "{report}");
    assert_eq!(report.lines().last(), Some("exit code: 3"));
}

#[test]
fn unterminated_stdout_still_gets_exit_code_on_its_own_line() {
    let executor = CommandExecutor::new();
    let report = executor.execute("printf 'no-newline'", None);

    assert!(report.contains("output:\nno-newline\n"), "{report}");
    assert_eq!(report.lines().last(), Some("exit code: 0"));
}

#[test]
fn timeout_kills_the_command_and_reports_the_configured_ceiling() {
    let executor = CommandExecutor::new();
    let started = Instant::now();
    let outcome = executor.run("sleep 5", Some(1));
    let elapsed = started.elapsed();

    assert_eq!(outcome, CommandOutcome::TimedOut { timeout_secs: 1 });
    assert!(
        elapsed < Duration::from_secs(4),
        "timeout wait took {elapsed:?}"
    );

    let report = render_report(&outcome);
    assert_eq!(report, "Error: command timed out after 1 second");
}

#[test]
fn timeout_report_tracks_the_configured_value_not_a_constant() {
    let report = render_report(&CommandOutcome::TimedOut { timeout_secs: 7 });
    assert_eq!(report, "Error: command timed out after 7 seconds");
}

#[test]
fn output_larger_than_a_pipe_buffer_is_drained_without_stalling() {
    let executor = CommandExecutor::new();
    let started = Instant::now();
    let outcome = executor.run("seq 1 60000", Some(2));
    let elapsed = started.elapsed();

    let CommandOutcome::Completed(result) = outcome else {
        panic!("expected completion, got {outcome:?} after {elapsed:?}");
    };
    assert_eq!(result.exit_code, Some(0));
    assert!(result.stdout.len() > 64 * 1024, "{}", result.stdout.len());
    assert!(result.stdout.ends_with("60000\n"));
    assert!(elapsed < Duration::from_secs(2), "wait took {elapsed:?}");
}

#[test]
fn large_stderr_does_not_block_completion_either() {
    let executor = CommandExecutor::new();
    let report = executor.execute("seq 1 60000 1>&2", Some(2));

    assert!(report.contains("error:\n"), "{}", &report[..80.min(report.len())]);
    assert!(report.contains("60000"), "stderr was truncated");
    assert_eq!(report.lines().last(), Some("exit code: 0"));
}

#[test]
fn launch_failure_renders_as_error_report_text() {
    let report = render_report(&CommandOutcome::Launch("sh: not found".to_string()));
    assert_eq!(report, "Error: failed to execute command: sh: not found");
}

#[test]
fn signal_termination_is_reported_in_the_exit_line() {
    let outcome = CommandOutcome::Completed(CommandResult {
        stdout: String::new(),
        stderr: String::new(),
        exit_code: None,
        timed_out: false,
    });
    let report = render_report(&outcome);
    assert_eq!(report.lines().last(), Some("exit code: terminated by signal"));
}

#[test]
fn default_timeout_is_thirty_seconds_and_configurable() {
    assert_eq!(CommandExecutor::new().default_timeout_secs(), 30);
    assert_eq!(
        CommandExecutor::new()
            .with_default_timeout(5)
            .default_timeout_secs(),
        5
    );
}
