//! Delivery history.
//!
//! The dispatcher writes one [`HistoryRecord`] per logical send through the
//! [`HistoryRecorder`] seam. [`HistoryStore`] is the on-disk implementation
//! used by the CLI: a JSON array kept newest-first.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::message::Message;

/// One logical send as remembered locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Id of the message that was sent.
    pub id: Uuid,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub content: String,
    /// Sound name, if one was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    /// Icon URL, if one was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Tap-through URL, if one was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Notification group, if one was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Whether the receiver was asked to archive the notification.
    pub archived_on_receiver: bool,
    /// When the record was written.
    pub timestamp: DateTime<Utc>,
    /// Every target selected for the send, whether or not it succeeded.
    pub target_names: Vec<String>,
}

impl HistoryRecord {
    /// Builds a record for `message` sent to `target_names`, stamped now.
    pub fn new(message: &Message, target_names: &[String]) -> Self {
        Self {
            id: message.id,
            title: message.title.clone(),
            content: message.content.clone(),
            sound: message.sound.clone(),
            icon: message.icon.clone(),
            url: message.url.clone(),
            group: message.group.clone(),
            archived_on_receiver: message.archive,
            timestamp: Utc::now(),
            target_names: target_names.to_vec(),
        }
    }
}

/// Durable sink for delivery history.
///
/// The dispatcher calls [`record`](Self::record) at most once per logical
/// send, from whichever target task succeeds first. The call runs on
/// tokio's blocking pool, so implementations may do synchronous file I/O.
pub trait HistoryRecorder: Send + Sync {
    /// Persists that `message` was sent to `target_names`.
    fn record(&self, message: &Message, target_names: &[String]) -> Result<()>;
}

/// JSON-file history store.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl HistoryStore {
    /// Opens (without creating) the history file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Opens the history file inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(crate::constants::HISTORY_FILE))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, newest first.
    pub fn list(&self) -> Result<Vec<HistoryRecord>> {
        let _guard = self.guard()?;
        self.load()
    }

    /// Removes the record with `id`. Returns whether anything was removed.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let _guard = self.guard()?;
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        let removed = records.len() != before;
        if removed {
            self.save(&records)?;
        }
        Ok(removed)
    }

    /// Removes every record. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let _guard = self.guard()?;
        let count = self.load()?.len();
        self.save(&[])?;
        Ok(count)
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|e| anyhow::anyhow!("History lock poisoned: {e}"))
    }

    fn load(&self) -> Result<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn save(&self, records: &[HistoryRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(records)?)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        // History holds message content: owner read/write only
        #[cfg(unix)]
        fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }
}

impl HistoryRecorder for HistoryStore {
    fn record(&self, message: &Message, target_names: &[String]) -> Result<()> {
        let _guard = self.guard()?;
        let mut records = self.load()?;
        let record = HistoryRecord::new(message, target_names);
        log::info!(
            "[History] Recording send {} to {} target(s)",
            record.id,
            record.target_names.len()
        );
        records.insert(0, record);
        self.save(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_record_copies_message_fields() {
        let message = Message::new("Alert", "Disk full")
            .with_sound("bell")
            .with_icon("https://example.com/i.png")
            .with_group("ops")
            .with_archive(true);
        let record = HistoryRecord::new(&message, &names(&["phone", "ipad"]));

        assert_eq!(record.id, message.id);
        assert_eq!(record.title, "Alert");
        assert_eq!(record.content, "Disk full");
        assert_eq!(record.sound.as_deref(), Some("bell"));
        assert_eq!(record.icon.as_deref(), Some("https://example.com/i.png"));
        assert_eq!(record.group.as_deref(), Some("ops"));
        assert!(record.archived_on_receiver);
        assert_eq!(record.target_names, vec!["phone", "ipad"]);
    }

    #[test]
    fn test_store_lists_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(dir.path());

        let first = Message::new("first", "1");
        let second = Message::new("second", "2");
        store.record(&first, &names(&["phone"])).unwrap();
        store.record(&second, &names(&["phone", "ipad"])).unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second.id);
        assert_eq!(records[1].id, first.id);
    }

    #[test]
    fn test_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(&dir.path().join("nested"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_store_delete_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(dir.path());
        let a = Message::new("a", "1");
        let b = Message::new("b", "2");
        store.record(&a, &names(&["phone"])).unwrap();
        store.record(&b, &names(&["phone"])).unwrap();

        assert!(store.delete(a.id).unwrap());
        assert!(!store.delete(a.id).unwrap());
        assert_eq!(store.list().unwrap().len(), 1);

        assert_eq!(store.clear().unwrap(), 1);
        assert!(store.list().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_store_file_is_owner_only() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(dir.path());
        store.record(&Message::new("a", "1"), &names(&["phone"])).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
