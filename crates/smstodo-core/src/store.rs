//! The list store contract and the in-memory implementation.
//!
//! Items are scoped by owner (the sender's E.164 number). Two items with
//! the same owner and case-insensitively equal trimmed text are the same
//! item; no implementation may hold duplicates under that equivalence.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TodoError};

/// One entry on an owner's list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    /// Sender phone number (E.164) — the partition key.
    pub owner: String,
    /// Task text exactly as submitted (original casing, trimmed).
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Case-insensitive trimmed equality, the identity rule for list items.
pub fn text_matches(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Contract over the persistent list store. Implementations must keep
/// `list_items` in insertion order and must never create duplicates under
/// [`text_matches`] — `create_item` is idempotent.
pub trait ListStore: Send + Sync {
    /// All items for `owner`, oldest first. Empty vec if none.
    fn list_items(&self, owner: &str) -> Result<Vec<TodoItem>>;

    /// The item matching `text` under [`text_matches`], if any.
    fn find_item(&self, owner: &str, text: &str) -> Result<Option<TodoItem>>;

    /// Insert a new item, or return the existing equivalent one unchanged.
    fn create_item(&self, owner: &str, text: &str) -> Result<TodoItem>;

    /// Remove the item matching `text`. Returns whether one was removed.
    fn delete_item(&self, owner: &str, text: &str) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store with the same semantics as the persistent one. Used in
/// tests and anywhere a throwaway store is wanted.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, Vec<TodoItem>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ListStore for MemoryStore {
    fn list_items(&self, owner: &str) -> Result<Vec<TodoItem>> {
        let items = self.items.lock().map_err(|e| TodoError::Store(e.to_string()))?;
        Ok(items.get(owner).cloned().unwrap_or_default())
    }

    fn find_item(&self, owner: &str, text: &str) -> Result<Option<TodoItem>> {
        let items = self.items.lock().map_err(|e| TodoError::Store(e.to_string()))?;
        Ok(items
            .get(owner)
            .and_then(|list| list.iter().find(|i| text_matches(&i.text, text)).cloned()))
    }

    fn create_item(&self, owner: &str, text: &str) -> Result<TodoItem> {
        let mut items = self.items.lock().map_err(|e| TodoError::Store(e.to_string()))?;
        let list = items.entry(owner.to_string()).or_default();
        if let Some(existing) = list.iter().find(|i| text_matches(&i.text, text)) {
            return Ok(existing.clone());
        }
        let item = TodoItem {
            owner: owner.to_string(),
            text: text.trim().to_string(),
            created_at: Utc::now(),
        };
        list.push(item.clone());
        Ok(item)
    }

    fn delete_item(&self, owner: &str, text: &str) -> Result<bool> {
        let mut items = self.items.lock().map_err(|e| TodoError::Store(e.to_string()))?;
        let Some(list) = items.get_mut(owner) else {
            return Ok(false);
        };
        let before = list.len();
        if let Some(pos) = list.iter().position(|i| text_matches(&i.text, text)) {
            list.remove(pos);
        }
        Ok(list.len() < before)
    }
}
