//! Command parsing and formatting
//!
//! Turns a raw input line into an `Input` and renders the help and user
//! listings. Nothing here touches shared state.

use crate::message::Message;
use crate::types::StatusList;
use crate::user::UserSummary;

/// Lines starting with this character are commands.
pub const COMMAND_PREFIX: char = '/';

/// The known commands, in help order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    List,
    Message,
    Status,
    Quit,
}

impl CommandKind {
    pub const ALL: [CommandKind; 5] = [
        CommandKind::Help,
        CommandKind::List,
        CommandKind::Message,
        CommandKind::Status,
        CommandKind::Quit,
    ];

    /// Look up a command by full name or single-letter alias
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "help" | "h" => Some(CommandKind::Help),
            "list" | "l" => Some(CommandKind::List),
            "message" | "m" => Some(CommandKind::Message),
            "status" | "s" => Some(CommandKind::Status),
            "quit" | "q" => Some(CommandKind::Quit),
            _ => None,
        }
    }

    pub fn usage(self) -> &'static str {
        match self {
            CommandKind::Help => "/help",
            CommandKind::List => "/list",
            CommandKind::Message => "/message <username> <message>",
            CommandKind::Status => "/status <status>",
            CommandKind::Quit => "/quit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CommandKind::Help => "Print this help message.",
            CommandKind::List => "List connected users.",
            CommandKind::Message => "Send private message to a user.",
            CommandKind::Status => "Set your status.",
            CommandKind::Quit => "Quit ChaTTY.",
        }
    }
}

/// A fully parsed command with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Message { to: String, text: String },
    Status(String),
    Quit,
}

/// What a single line from an active client means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line, ignored
    Empty,
    /// Public message text
    Chat(String),
    Command(Command),
}

impl Input {
    /// Parse one line
    ///
    /// Unknown commands and commands missing their arguments become
    /// `Command::Help`.
    pub fn parse(line: &str) -> Self {
        let Some(body) = line.strip_prefix(COMMAND_PREFIX) else {
            if line.trim().is_empty() {
                return Input::Empty;
            }
            return Input::Chat(line.to_string());
        };

        let (name, args) = split_token(body);
        let command = match CommandKind::from_name(name) {
            Some(CommandKind::Help) | None => Command::Help,
            Some(CommandKind::List) => Command::List,
            Some(CommandKind::Quit) => Command::Quit,
            Some(CommandKind::Status) => match split_token(args) {
                ("", _) => Command::Help,
                (status, _) => Command::Status(status.to_string()),
            },
            Some(CommandKind::Message) => match split_token(args) {
                ("", _) | (_, "") => Command::Help,
                (to, text) => Command::Message {
                    to: to.to_string(),
                    text: text.to_string(),
                },
            },
        };
        Input::Command(command)
    }
}

/// Split off the first whitespace-delimited token; the remainder is trimmed.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// Usage listing, one info message per line
pub fn help_lines(statuses: &StatusList) -> Vec<Message> {
    let mut lines = vec![Message::info("  Usage:")];
    for kind in CommandKind::ALL {
        let usage = match kind {
            CommandKind::Status => format!("/status ({})", statuses.as_slice().join("|")),
            other => other.usage().to_string(),
        };
        lines.push(Message::info(format!(
            "   {}: {}",
            usage,
            kind.description()
        )));
    }
    lines.push(Message::info(
        "   <message>: Send a public message to all connected users",
    ));
    lines
}

/// Connected-users listing, one status message per line
pub fn user_list_lines(users: &[UserSummary]) -> Vec<Message> {
    let mut lines = vec![Message::status("  CONNECTED USERS:")];
    lines.extend(
        users
            .iter()
            .map(|user| Message::status(format!("    {} ({})", user.username, user.status))),
    );
    lines
}
