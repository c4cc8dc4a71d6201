use autodocs_core::{clock, ChangePayload, DiffSection, TriggeredBy, EVENT_FILE_CHANGE};
use autodocs_git::{GitError, RepoSnapshot, RepoState};

use crate::deliver::{DeliveryError, Sink};
use crate::events::FileEvent;

/// What a single flush did.
#[derive(Debug)]
pub enum FlushOutcome {
    /// A git query failed; nothing was sent.
    QueryFailed(GitError),
    /// No staged diff, no unstaged diff, no untracked files; nothing was sent.
    NothingToReport,
    Delivered { status: u16 },
    DeliveryFailed(DeliveryError),
}

impl FlushOutcome {
    pub fn attempted_delivery(&self) -> bool {
        matches!(
            self,
            FlushOutcome::Delivered { .. } | FlushOutcome::DeliveryFailed(_)
        )
    }
}

/// Assemble the wire payload from a snapshot and the event that closed the
/// debounce window.
pub fn build_payload(
    repository: &str,
    snap: RepoSnapshot,
    trigger: &FileEvent,
    timestamp: String,
) -> ChangePayload {
    ChangePayload {
        event: EVENT_FILE_CHANGE.to_string(),
        repository: repository.to_string(),
        branch: snap.branch,
        triggered_by: Some(TriggeredBy {
            file: trigger.display_path(),
            event_type: Some(trigger.kind),
        }),
        staged_changes: DiffSection::new(snap.staged_files, snap.staged_diff),
        unstaged_changes: DiffSection::new(snap.unstaged_files, snap.unstaged_diff),
        untracked_files: snap.untracked_files,
        last_commit: Some(snap.last_commit),
        timestamp,
    }
}

/// Queries repo state and forwards it to a sink, one flush at a time.
pub struct ChangeNotifier<S, K> {
    repo: S,
    sink: K,
    repository: String,
}

impl<S: RepoState, K: Sink> ChangeNotifier<S, K> {
    pub fn new(repository: impl Into<String>, repo: S, sink: K) -> Self {
        Self {
            repo,
            sink,
            repository: repository.into(),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Snapshot, filter, deliver. Blocks for the duration of the git
    /// queries and the HTTP request.
    pub fn flush(&self, trigger: &FileEvent) -> FlushOutcome {
        let snap = match self.repo.snapshot() {
            Ok(snap) => snap,
            Err(e) => {
                tracing::error!(error = %e, "cannot read git state, skipping notification");
                return FlushOutcome::QueryFailed(e);
            }
        };

        if !snap.has_changes() {
            tracing::info!("no changes to report");
            return FlushOutcome::NothingToReport;
        }

        let payload = build_payload(&self.repository, snap, trigger, clock::now_rfc3339());
        match self.sink.deliver(&payload) {
            Ok(status) => {
                tracing::info!(
                    staged = payload.staged_changes.count,
                    unstaged = payload.unstaged_changes.count,
                    untracked = payload.untracked_files.len(),
                    status,
                    "webhook sent"
                );
                FlushOutcome::Delivered { status }
            }
            Err(e) => {
                match &e {
                    DeliveryError::Unreachable(_) => tracing::error!(
                        error = %e,
                        url = self.sink.target(),
                        "webhook failed: is the receiver running?"
                    ),
                    DeliveryError::Status(code) => {
                        tracing::error!(status = code, "webhook failed: server responded with error")
                    }
                    _ => tracing::error!(error = %e, "webhook failed"),
                }
                FlushOutcome::DeliveryFailed(e)
            }
        }
    }
}
