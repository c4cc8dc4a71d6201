//! Bridge from `notify` events to qualifying [`FileEvent`]s.

use std::path::{Path, PathBuf};

use autodocs_core::ChangeKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;

use crate::ignore::IgnoreRules;

/// A qualifying change, path relative to the watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl FileEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Relative path as sent in the payload.
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Map a raw event to (kind, absolute path) pairs. Access, metadata-only and
/// directory events produce nothing.
pub fn classify(event: &Event) -> Vec<(ChangeKind, &Path)> {
    let first = event.paths.first().map(PathBuf::as_path);
    let kind = match event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => None,
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            return match event.paths.as_slice() {
                [from, to] if !to.is_dir() => vec![
                    (ChangeKind::Deleted, from.as_path()),
                    (ChangeKind::Created, to.as_path()),
                ],
                _ => Vec::new(),
            };
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    };
    match (kind, first) {
        (Some(ChangeKind::Deleted), Some(path)) => vec![(ChangeKind::Deleted, path)],
        (Some(kind), Some(path)) if !path.is_dir() => vec![(kind, path)],
        _ => Vec::new(),
    }
}

/// Filter and relativize a raw event against `root`.
pub fn qualify(event: &Event, root: &Path, rules: &IgnoreRules) -> Vec<FileEvent> {
    classify(event)
        .into_iter()
        .filter_map(|(kind, path)| {
            let rel = path.strip_prefix(root).ok()?;
            if rel.as_os_str().is_empty() || rules.is_ignored(rel) {
                return None;
            }
            Some(FileEvent::new(kind, rel))
        })
        .collect()
}

/// Start a recursive watch on `root`, forwarding qualifying events to `tx`.
/// The returned watcher must be kept alive for as long as events are wanted.
pub fn start(
    root: &Path,
    rules: IgnoreRules,
    tx: UnboundedSender<FileEvent>,
) -> notify::Result<RecommendedWatcher> {
    let root_owned = root.to_path_buf();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for change in qualify(&event, &root_owned, &rules) {
                tracing::info!(kind = %change.kind, path = %change.display_path(), "file event");
                let _ = tx.send(change);
            }
        }
        Err(e) => tracing::warn!(error = %e, "watcher error"),
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok(watcher)
}
