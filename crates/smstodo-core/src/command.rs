//! Command grammar for inbound messages.
//!
//! A message is a whitespace-delimited keyword followed by an optional
//! argument. Keywords are matched case-insensitively; the argument keeps
//! its original casing and internal whitespace.

/// A parsed inbound command. Every possible input maps to exactly one
/// variant — parsing never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `add <item>` — add an item to the sender's list.
    Add(String),
    /// `done <item>` — remove an item (case-insensitive exact match).
    Done(String),
    /// `list` — show all open items.
    List,
    /// `help` — show usage.
    Help,
    /// Anything else, including empty messages and `add`/`done` with no
    /// argument.
    Unknown,
}

impl Command {
    /// Parse raw message text into a `Command`. Total: never errors.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (keyword, argument) = match trimmed.split_once(char::is_whitespace) {
            Some((kw, rest)) => (kw, rest.trim()),
            None => (trimmed, ""),
        };

        match keyword.to_lowercase().as_str() {
            "add" if !argument.is_empty() => Command::Add(argument.to_string()),
            "done" if !argument.is_empty() => Command::Done(argument.to_string()),
            "list" => Command::List,
            "help" => Command::Help,
            _ => Command::Unknown,
        }
    }

    /// Keyword name for logging.
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Done(_) => "done",
            Command::List => "list",
            Command::Help => "help",
            Command::Unknown => "unknown",
        }
    }
}
