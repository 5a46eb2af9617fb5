#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Key(String),
    Run(String),
    History,
    Clear,
    Logout,
    Quit,
    Unknown(String),
}

pub fn parse_console_command(input: &str) -> Option<ConsoleCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/help" => ConsoleCommand::Help,
        "/key" => ConsoleCommand::Key(rest.to_string()),
        "/run" => ConsoleCommand::Run(rest.to_string()),
        "/history" => ConsoleCommand::History,
        "/clear" => ConsoleCommand::Clear,
        "/logout" => ConsoleCommand::Logout,
        "/quit" => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}
