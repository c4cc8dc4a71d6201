//! Working-tree watcher.
//!
//! filesystem event → debounce window → git snapshot → JSON POST.
//! Runs on a single thread: the flush blocks the loop, so at most one flush
//! is ever in flight and events arriving meanwhile open a fresh window.

pub mod debounce;
pub mod deliver;
pub mod events;
pub mod flush;
pub mod ignore;

use anyhow::Context;
use autodocs_core::WatchConfig;
use autodocs_git::{GitRepo, RepoState};
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub use debounce::Debouncer;
pub use deliver::{DeliveryError, Sink, WebhookSink};
pub use events::FileEvent;
pub use flush::{build_payload, ChangeNotifier, FlushOutcome};
pub use ignore::IgnoreRules;

/// Feed settled events to `notifier` until `rx` closes. Returns the number
/// of flushes performed.
pub async fn drive<S: RepoState, K: Sink>(
    notifier: &ChangeNotifier<S, K>,
    debouncer: &mut Debouncer<FileEvent>,
    rx: &mut UnboundedReceiver<FileEvent>,
) -> usize {
    let mut flushes = 0;
    while let Some(trigger) = debouncer.next(rx).await {
        tracing::debug!(path = %trigger.display_path(), kind = %trigger.kind, "window settled");
        notifier.flush(&trigger);
        flushes += 1;
    }
    flushes
}

/// Watch `config.repo_path` until Ctrl-C.
pub async fn run(config: WatchConfig) -> anyhow::Result<()> {
    let root = config
        .repo_path
        .canonicalize()
        .with_context(|| format!("cannot resolve repo path {}", config.repo_path.display()))?;
    let rules = IgnoreRules::new(&config.ignore).context("invalid ignore pattern")?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _watcher = events::start(&root, rules, tx)
        .with_context(|| format!("cannot watch {}", root.display()))?;

    let repo = GitRepo::open(&root);
    let notifier = ChangeNotifier::new(
        repo.name(),
        repo,
        WebhookSink::new(config.webhook_url.clone(), config.timeout()),
    );
    let mut debouncer = Debouncer::new(config.debounce());

    tracing::info!(
        repo = notifier.repository(),
        path = %root.display(),
        webhook = %config.webhook_url,
        debounce_ms = config.debounce_ms,
        "watcher ready, tracking staged and unstaged changes"
    );

    tokio::select! {
        flushes = drive(&notifier, &mut debouncer, &mut rx) => {
            tracing::warn!(flushes, "file watcher stopped");
        }
        res = tokio::signal::ctrl_c() => {
            res.context("cannot listen for Ctrl-C")?;
            tracing::info!("stopping watcher");
        }
    }
    Ok(())
}

/// Run one flush right now, outside the watch loop.
pub fn send_once(config: &WatchConfig) -> anyhow::Result<FlushOutcome> {
    let root = config
        .repo_path
        .canonicalize()
        .with_context(|| format!("cannot resolve repo path {}", config.repo_path.display()))?;
    let repo = GitRepo::open(&root);
    let notifier = ChangeNotifier::new(
        repo.name(),
        repo,
        WebhookSink::new(config.webhook_url.clone(), config.timeout()),
    );
    let trigger = FileEvent::new(autodocs_core::ChangeKind::Modified, ".");
    Ok(notifier.flush(&trigger))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flush::tests::{dirty_snapshot, FixedRepo, RecordingSink};
    use autodocs_core::ChangeKind;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn burst_inside_window_flushes_once_with_last_event() {
        let notifier = ChangeNotifier::new(
            "demo",
            FixedRepo(Ok(dirty_snapshot())),
            RecordingSink::default(),
        );
        let mut debouncer = Debouncer::new(Duration::from_millis(2000));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let producer = tokio::spawn(async move {
            tx.send(FileEvent::new(ChangeKind::Created, "a.txt")).unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            tx.send(FileEvent::new(ChangeKind::Modified, "a.txt")).unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            tx.send(FileEvent::new(ChangeKind::Deleted, "b.txt")).unwrap();
            // Keep the channel open past the window, then close it.
            tokio::time::sleep(Duration::from_millis(5000)).await;
        });

        let flushes = drive(&notifier, &mut debouncer, &mut rx).await;
        producer.await.unwrap();

        assert_eq!(flushes, 1);
        let sent = notifier.sink().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let trigger = sent[0].triggered_by.as_ref().unwrap();
        assert_eq!(trigger.file, "b.txt");
        assert_eq!(trigger.event_type, Some(ChangeKind::Deleted));
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_flush_separately() {
        let notifier = ChangeNotifier::new(
            "demo",
            FixedRepo(Ok(dirty_snapshot())),
            RecordingSink::default(),
        );
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            tx.send(FileEvent::new(ChangeKind::Modified, "one.txt")).unwrap();
            tokio::time::sleep(Duration::from_millis(3000)).await;
            tx.send(FileEvent::new(ChangeKind::Modified, "two.txt")).unwrap();
            tokio::time::sleep(Duration::from_millis(3000)).await;
        });

        assert_eq!(drive(&notifier, &mut debouncer, &mut rx).await, 2);
        let files: Vec<String> = notifier
            .sink()
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.triggered_by.as_ref().unwrap().file.clone())
            .collect();
        assert_eq!(files, vec!["one.txt".to_string(), "two.txt".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_queries_never_reach_the_sink() {
        let notifier = ChangeNotifier::new(
            "demo",
            FixedRepo(Err("fatal: not a git repository".into())),
            RecordingSink::default(),
        );
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(FileEvent::new(ChangeKind::Modified, "x")).unwrap();
        drop(tx);

        assert_eq!(drive(&notifier, &mut debouncer, &mut rx).await, 1);
        assert!(notifier.sink().sent.lock().unwrap().is_empty());
    }
}
