//! Applies a parsed [`Command`] to a [`ListStore`] and builds the reply.

use crate::command::Command;
use crate::error::Result;
use crate::store::ListStore;

/// Largest reply we hand to the SMS transport (concatenated-SMS limit).
pub const MAX_REPLY_LEN: usize = 1600;

const TRUNCATION_MARKER: &str = "\n[truncated]";

const HELP_TEXT: &str = "Available commands:\n\
    - add [item]: Add a TODO\n\
    - done [item]: Remove a TODO (case-insensitive exact match)\n\
    - list: Show open TODOs\n\
    - help: Show this message";

const UNKNOWN_TEXT: &str = "Unknown command. Send 'help' for the list of commands.";

/// Execute `command` against the store scoped to `owner` and return the
/// reply text. `Help` and `Unknown` never touch the store; store failures
/// on the other commands propagate to the caller.
pub fn execute(command: &Command, owner: &str, store: &dyn ListStore) -> Result<String> {
    let reply = match command {
        Command::Add(text) => {
            if let Some(existing) = store.find_item(owner, text)? {
                tracing::info!(owner, text = %existing.text, "add: already present");
                format!("Already on the list: {}", existing.text)
            } else {
                let item = store.create_item(owner, text)?;
                tracing::info!(owner, text = %item.text, "add: created");
                format!("Added: {}", item.text)
            }
        }
        Command::Done(text) => {
            match store.find_item(owner, text)? {
                Some(item) => {
                    store.delete_item(owner, text)?;
                    tracing::info!(owner, text = %item.text, "done: removed");
                    format!("Done: {}", item.text)
                }
                None => {
                    tracing::info!(owner, text = %text, "done: no match");
                    format!("Not found: {}", text.trim())
                }
            }
        }
        Command::List => {
            let items = store.list_items(owner)?;
            tracing::info!(owner, count = items.len(), "list");
            if items.is_empty() {
                "No open TODOs!".to_string()
            } else {
                let mut reply = String::from("Open TODOs:");
                for item in &items {
                    reply.push_str("\n- ");
                    reply.push_str(&item.text);
                }
                reply
            }
        }
        Command::Help => HELP_TEXT.to_string(),
        Command::Unknown => UNKNOWN_TEXT.to_string(),
    };
    Ok(truncate_reply(reply))
}

/// Cap the reply at [`MAX_REPLY_LEN`] chars, cutting on a char boundary
/// and appending a truncation indicator.
fn truncate_reply(reply: String) -> String {
    if reply.chars().count() <= MAX_REPLY_LEN {
        return reply;
    }
    let keep = MAX_REPLY_LEN - TRUNCATION_MARKER.chars().count();
    let mut out: String = reply.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
