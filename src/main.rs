use std::io::{self, BufRead, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chat_console::app::{App, AUTH_FAILURE_MESSAGE, HELP_TEXT};
use chat_console::backend::{ApiChatBackend, CancelSignal, ChatBackend};
use chat_console::commands::{parse_console_command, ConsoleCommand};
use chat_console::exec::CommandExecutor;
use chat_console::secrets::Secrets;
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let secrets = Secrets::load_from_env().map_err(io::Error::other)?;
    let executor = CommandExecutor::new().with_default_timeout(secrets.command_timeout_secs);
    let backend = ApiChatBackend::new(secrets.model.clone(), secrets.base_url.clone());
    let mut app = App::new(secrets.credentials.clone(), executor);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("chat console — log in to continue");
    while !app.should_exit {
        if !app.is_authenticated() {
            let Some(username) = read_prompted_line(&mut lines, "username: ")? else {
                break;
            };
            let Some(password) = read_prompted_line(&mut lines, "password: ")? else {
                break;
            };

            if app.try_login(&username, &password) {
                println!("Login successful.");
                println!("{HELP_TEXT}");
            } else {
                println!("{AUTH_FAILURE_MESSAGE}");
            }
            continue;
        }

        let Some(line) = read_prompted_line(&mut lines, "> ")? else {
            break;
        };

        match parse_console_command(&line) {
            Some(command) => dispatch_command(&mut app, command),
            None => {
                let prompt = line.trim();
                if !prompt.is_empty() {
                    run_chat_turn(&mut app, &backend, prompt);
                }
            }
        }
    }

    Ok(())
}

fn dispatch_command(app: &mut App, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Help => println!("{HELP_TEXT}"),
        ConsoleCommand::Key(value) => println!("{}", app.set_api_key(&value)),
        ConsoleCommand::Run(command) => match app.run_command(&command) {
            Ok(report) | Err(report) => println!("{report}"),
        },
        ConsoleCommand::History => println!("{}", app.render_history()),
        ConsoleCommand::Clear => {
            app.clear_chat();
            println!("Chat log cleared.");
        }
        ConsoleCommand::Logout => {
            app.logout();
            println!("Logged out.");
        }
        ConsoleCommand::Quit => app.should_exit = true,
        ConsoleCommand::Unknown(command) => {
            println!("Unknown command '{command}'. {HELP_TEXT}");
        }
    }
}

fn run_chat_turn(app: &mut App, backend: &dyn ChatBackend, prompt: &str) {
    let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
    let mut print_delta = |delta: &str| {
        print!("{delta}");
        let _ = io::stdout().flush();
    };

    match app.submit_chat(prompt, backend, &cancel, &mut print_delta) {
        Ok(_reply) => println!(),
        Err(message) => println!("{message}"),
    }
}

fn read_prompted_line(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    prompt: &str,
) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;

    match lines.next() {
        Some(line) => Ok(Some(line?)),
        None => Ok(None),
    }
}
