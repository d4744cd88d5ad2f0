//! Persistent list storage using redb.
//!
//! # Table design
//!
//! A single `todos` table uses a composite key:
//! ```text
//! [ owner utf8 bytes | 0x00 | seq: u64 big-endian (8 bytes) ]
//! ```
//!
//! Owner numbers are E.164 (`+` and digits) and never contain NUL, so the
//! separator is unambiguous. Because the sequence occupies the low bytes in
//! big-endian encoding, byte ordering within an owner's prefix equals
//! insertion ordering — a single range scan returns the owner's items
//! oldest-first with no post-sorting.
//!
//! `create_item` runs its duplicate check and insert inside one write
//! transaction. redb serializes writers, so two racing adds of equivalent
//! text cannot both insert.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::{Result, TodoError};
use crate::store::{text_matches, ListStore, TodoItem};

/// Key: composite (owner ++ 0x00 ++ seq big-endian).
/// Value: JSON-encoded TodoItem.
const TODOS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("todos");

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

fn item_key(owner: &str, seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(owner.len() + 9);
    key.extend_from_slice(owner.as_bytes());
    key.push(0);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Range bounds covering every sequence number under `owner`.
fn owner_range(owner: &str) -> (Vec<u8>, Vec<u8>) {
    (item_key(owner, 0), item_key(owner, u64::MAX))
}

fn seq_of(key: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&key[key.len() - 8..]);
    u64::from_be_bytes(buf)
}

// ---------------------------------------------------------------------------
// RedbStore
// ---------------------------------------------------------------------------

/// redb-backed [`ListStore`].
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the database at `path`, ensuring the `todos` table
    /// exists before any reads.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(|e| TodoError::Store(e.to_string()))?;
        let wt = db.begin_write().map_err(|e| TodoError::Store(e.to_string()))?;
        wt.open_table(TODOS)
            .map_err(|e| TodoError::Store(e.to_string()))?;
        wt.commit().map_err(|e| TodoError::Store(e.to_string()))?;
        Ok(Self { db })
    }

    /// All `(seq, item)` pairs for `owner`, ascending by sequence.
    fn scan_owner(
        &self,
        table: &impl ReadableTable<&'static [u8], &'static [u8]>,
        owner: &str,
    ) -> Result<Vec<(u64, TodoItem)>> {
        let (low, high) = owner_range(owner);
        let mut out = Vec::new();
        let iter = table
            .range(low.as_slice()..=high.as_slice())
            .map_err(|e| TodoError::Store(e.to_string()))?;
        for entry in iter {
            let (key, value) = entry.map_err(|e| TodoError::Store(e.to_string()))?;
            let item: TodoItem = serde_json::from_slice(value.value())?;
            out.push((seq_of(key.value()), item));
        }
        Ok(out)
    }
}

impl ListStore for RedbStore {
    fn list_items(&self, owner: &str) -> Result<Vec<TodoItem>> {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| TodoError::Store(e.to_string()))?;
        let table = rt
            .open_table(TODOS)
            .map_err(|e| TodoError::Store(e.to_string()))?;
        Ok(self
            .scan_owner(&table, owner)?
            .into_iter()
            .map(|(_, item)| item)
            .collect())
    }

    fn find_item(&self, owner: &str, text: &str) -> Result<Option<TodoItem>> {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| TodoError::Store(e.to_string()))?;
        let table = rt
            .open_table(TODOS)
            .map_err(|e| TodoError::Store(e.to_string()))?;
        Ok(self
            .scan_owner(&table, owner)?
            .into_iter()
            .map(|(_, item)| item)
            .find(|item| text_matches(&item.text, text)))
    }

    fn create_item(&self, owner: &str, text: &str) -> Result<TodoItem> {
        let wt = self
            .db
            .begin_write()
            .map_err(|e| TodoError::Store(e.to_string()))?;
        let created;
        {
            let mut table = wt
                .open_table(TODOS)
                .map_err(|e| TodoError::Store(e.to_string()))?;

            // Check-then-insert under the write lock: racing adds of
            // equivalent text see each other's writes.
            let existing = self.scan_owner(&table, owner)?;
            if let Some((_, item)) = existing
                .iter()
                .find(|(_, item)| text_matches(&item.text, text))
            {
                return Ok(item.clone());
            }

            let next_seq = existing.last().map(|(seq, _)| seq + 1).unwrap_or(0);
            created = TodoItem {
                owner: owner.to_string(),
                text: text.trim().to_string(),
                created_at: chrono::Utc::now(),
            };
            let key = item_key(owner, next_seq);
            let value = serde_json::to_vec(&created)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(|e| TodoError::Store(e.to_string()))?;
        }
        wt.commit().map_err(|e| TodoError::Store(e.to_string()))?;
        Ok(created)
    }

    fn delete_item(&self, owner: &str, text: &str) -> Result<bool> {
        let wt = self
            .db
            .begin_write()
            .map_err(|e| TodoError::Store(e.to_string()))?;
        let removed;
        {
            let mut table = wt
                .open_table(TODOS)
                .map_err(|e| TodoError::Store(e.to_string()))?;
            let target = self
                .scan_owner(&table, owner)?
                .into_iter()
                .find(|(_, item)| text_matches(&item.text, text));
            match target {
                Some((seq, _)) => {
                    let key = item_key(owner, seq);
                    table
                        .remove(key.as_slice())
                        .map_err(|e| TodoError::Store(e.to_string()))?;
                    removed = true;
                }
                None => removed = false,
            }
        }
        wt.commit().map_err(|e| TodoError::Store(e.to_string()))?;
        Ok(removed)
    }
}
