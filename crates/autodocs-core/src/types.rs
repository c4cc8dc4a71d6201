use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Value of `ChangePayload::event` for every payload the watcher sends.
pub const EVENT_FILE_CHANGE: &str = "file_change";

/// Diff id: unix milliseconds of receipt on the receiver side.
pub type DiffId = u64;

/// Filesystem change that triggered a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ChangeKind::Created),
            "modified" => Ok(ChangeKind::Modified),
            "deleted" => Ok(ChangeKind::Deleted),
            other => Err(format!("unknown change kind: {other}")),
        }
    }
}

/// `null` decodes as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unknown or non-string event types decode as `None`.
fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<ChangeKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(|s| s.parse().ok()))
}

/// The file event that closed the debounce window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggeredBy {
    /// Path relative to the repository root.
    #[serde(deserialize_with = "null_as_default")]
    pub file: String,
    #[serde(
        deserialize_with = "lenient_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_type: Option<ChangeKind>,
}

/// One side of the working tree state: staged or unstaged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSection {
    #[serde(deserialize_with = "null_as_default")]
    pub files: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub diff: String,
    #[serde(deserialize_with = "null_as_default")]
    pub count: usize,
}

impl DiffSection {
    /// Build a section whose `count` always equals `files.len()`.
    pub fn new(files: Vec<String>, diff: String) -> Self {
        let count = files.len();
        Self { files, diff, count }
    }

    pub fn has_diff(&self) -> bool {
        !self.diff.is_empty()
    }
}

/// JSON body posted by the watcher to `POST /autodocs/git`.
///
/// Missing and `null` fields both take their default, so the receiver
/// accepts partial payloads from other clients the same way it accepts
/// complete ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangePayload {
    #[serde(deserialize_with = "null_as_default")]
    pub event: String,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: String,
    #[serde(deserialize_with = "null_as_default")]
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<TriggeredBy>,
    #[serde(deserialize_with = "null_as_default")]
    pub staged_changes: DiffSection,
    #[serde(deserialize_with = "null_as_default")]
    pub unstaged_changes: DiffSection,
    #[serde(deserialize_with = "null_as_default")]
    pub untracked_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
}

/// Which diff a blob holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Staged,
    Unstaged,
}

impl DiffKind {
    pub const ALL: [DiffKind; 2] = [DiffKind::Staged, DiffKind::Unstaged];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiffKind::Staged => "staged",
            DiffKind::Unstaged => "unstaged",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiffKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staged" => Ok(DiffKind::Staged),
            "unstaged" => Ok(DiffKind::Unstaged),
            other => Err(format!("unknown diff kind: {other}")),
        }
    }
}

/// Diff-free projection of a payload, as kept in the receiver's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: DiffId,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<TriggeredBy>,
    #[serde(default)]
    pub staged_files: Vec<String>,
    #[serde(default)]
    pub unstaged_files: Vec<String>,
    #[serde(default)]
    pub untracked_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    #[serde(default)]
    pub has_staged_diff: bool,
    #[serde(default)]
    pub has_unstaged_diff: bool,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub received_at: String,
}

impl LogEntry {
    /// Project a payload. The diff flags must reflect blobs actually written,
    /// not the presence of diff text in the payload.
    pub fn from_payload(
        id: DiffId,
        payload: &ChangePayload,
        has_staged_diff: bool,
        has_unstaged_diff: bool,
        received_at: String,
    ) -> Self {
        Self {
            id,
            repository: payload.repository.clone(),
            branch: payload.branch.clone(),
            triggered_by: payload.triggered_by.clone(),
            staged_files: payload.staged_changes.files.clone(),
            unstaged_files: payload.unstaged_changes.files.clone(),
            untracked_files: payload.untracked_files.clone(),
            last_commit: payload.last_commit.clone(),
            has_staged_diff,
            has_unstaged_diff,
            timestamp: payload.timestamp.clone(),
            received_at,
        }
    }

    pub fn has_diff(&self, kind: DiffKind) -> bool {
        match kind {
            DiffKind::Staged => self.has_staged_diff,
            DiffKind::Unstaged => self.has_unstaged_diff,
        }
    }
}
