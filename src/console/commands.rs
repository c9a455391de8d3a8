/// Line that ends an email being pasted.
pub const SUBMIT_MARKER: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Stats,
    History,
    Show(u64),
    Export,
    Clear,
    Status,
    Help,
    Quit,
}

/// Parses a `:command` line. Returns `None` for anything that is not a command.
pub fn parse_command(line: &str) -> Option<Result<Command, String>> {
    let body = line.trim().strip_prefix(':')?;
    let mut parts = body.split_whitespace();
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    let arg = parts.next();

    let command = match name.as_str() {
        "stats" => Ok(Command::Stats),
        "history" => Ok(Command::History),
        "show" => match arg.map(str::parse::<u64>) {
            Some(Ok(id)) => Ok(Command::Show(id)),
            Some(Err(_)) => Err(format!("not an entry id: {}", arg.unwrap_or_default())),
            None => Err("usage: :show <id>".to_string()),
        },
        "export" => Ok(Command::Export),
        "clear" => Ok(Command::Clear),
        "status" => Ok(Command::Status),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "" => Err("empty command; try :help".to_string()),
        other => Err(format!("unknown command :{other}; try :help")),
    };
    Some(command)
}

pub fn is_submit(line: &str) -> bool {
    line.trim() == SUBMIT_MARKER
}

pub fn is_confirmation(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "yes" | "y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command(":stats"), Some(Ok(Command::Stats)));
        assert_eq!(parse_command("  :HISTORY "), Some(Ok(Command::History)));
        assert_eq!(parse_command(":show 12"), Some(Ok(Command::Show(12))));
        assert_eq!(parse_command(":q"), Some(Ok(Command::Quit)));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("Dear customer,"), None);
        assert_eq!(parse_command("Subject: urgent"), None);
    }

    #[test]
    fn bad_commands_report_errors() {
        assert!(matches!(parse_command(":show"), Some(Err(_))));
        assert!(matches!(parse_command(":show abc"), Some(Err(_))));
        assert!(matches!(parse_command(":frobnicate"), Some(Err(_))));
    }

    #[test]
    fn submit_and_confirmation_lines() {
        assert!(is_submit(" . "));
        assert!(!is_submit(".."));
        assert!(is_confirmation("YES"));
        assert!(!is_confirmation("no"));
    }
}
