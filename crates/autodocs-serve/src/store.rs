//! Bounded change log: read all, append one, cap the length.

use std::path::{Path, PathBuf};

use autodocs_core::{write_atomic, LogEntry};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed log {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode log: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait LogStore: Send + Sync {
    /// All entries, oldest first.
    fn load(&self) -> Result<Vec<LogEntry>, StoreError>;

    /// Append one entry, evicting the oldest entries beyond capacity.
    fn append(&self, entry: LogEntry) -> Result<(), StoreError>;
}

/// Up to `limit` entries, newest first.
pub fn newest_first(entries: &[LogEntry], limit: usize) -> Vec<LogEntry> {
    entries.iter().rev().take(limit).cloned().collect()
}

/// Log persisted as one pretty-printed JSON array, rewritten on each append.
pub struct JsonFileLog {
    path: PathBuf,
    capacity: usize,
}

impl JsonFileLog {
    /// Open the log at `path`, creating an empty array if the file is missing.
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> std::io::Result<Self> {
        let path = path.into();
        if !path.exists() {
            write_atomic(&path, b"[]")?;
        }
        Ok(Self { path, capacity })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl LogStore for JsonFileLog {
    fn load(&self) -> Result<Vec<LogEntry>, StoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn append(&self, entry: LogEntry) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.push(entry);
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
        let json = serde_json::to_string_pretty(&entries)?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64) -> LogEntry {
        LogEntry {
            id,
            repository: "demo".into(),
            branch: "main".into(),
            triggered_by: None,
            staged_files: vec![],
            unstaged_files: vec![],
            untracked_files: vec![],
            last_commit: None,
            has_staged_diff: false,
            has_unstaged_diff: false,
            timestamp: String::new(),
            received_at: String::new(),
        }
    }

    #[test]
    fn open_creates_empty_log() {
        let tmp = tempfile::tempdir().unwrap();
        let log = JsonFileLog::open(tmp.path().join("webhook-logs.json"), 100).unwrap();
        assert!(log.load().unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(log.path()).unwrap(), "[]");
    }

    #[test]
    fn open_keeps_existing_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("webhook-logs.json");
        JsonFileLog::open(&path, 100).unwrap().append(entry(1)).unwrap();
        let reopened = JsonFileLog::open(&path, 100).unwrap();
        assert_eq!(reopened.load().unwrap()[0].id, 1);
    }

    #[test]
    fn log_is_capped_and_evicts_oldest() {
        let tmp = tempfile::tempdir().unwrap();
        let log = JsonFileLog::open(tmp.path().join("log.json"), 100).unwrap();
        for id in 1..=101 {
            log.append(entry(id)).unwrap();
        }
        let entries = log.load().unwrap();
        assert_eq!(entries.len(), 100);
        assert_eq!(entries.first().unwrap().id, 2);
        assert_eq!(entries.last().unwrap().id, 101);
    }

    #[test]
    fn newest_first_takes_tail_in_reverse() {
        let entries: Vec<LogEntry> = (1..=8).map(entry).collect();
        let ids: Vec<u64> = newest_first(&entries, 5).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![8, 7, 6, 5, 4]);
        assert_eq!(newest_first(&entries, 50).len(), 8);
    }

    #[test]
    fn malformed_log_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let log = JsonFileLog::open(tmp.path().join("log.json"), 100).unwrap();
        std::fs::write(log.path(), "{ nope").unwrap();
        assert!(matches!(log.load(), Err(StoreError::Malformed { .. })));
        assert!(log.append(entry(1)).is_err());
    }
}
