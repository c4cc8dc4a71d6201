use std::path::Path;
use std::process::Command;
use std::time::Duration;

use autodocs_core::{ChangeKind, ChangePayload, DiffSection, ServeConfig, TriggeredBy, WatchConfig};
use autodocs_watch::{FlushOutcome, Sink, WebhookSink};

/// Start the receiver on an ephemeral port; returns its webhook URL.
async fn spawn_receiver(data_dir: &Path) -> String {
    let config = ServeConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    let app = autodocs_serve::router(&config).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/autodocs/git")
}

fn read_log(data_dir: &Path) -> Vec<serde_json::Value> {
    let raw = std::fs::read_to_string(data_dir.join("webhook-logs.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

#[tokio::test]
async fn sink_delivers_to_receiver() {
    let data = tempfile::tempdir().unwrap();
    let url = spawn_receiver(data.path()).await;

    let diff = "diff --git a/a.txt b/a.txt\n--- a/a.txt\n+++ b/a.txt\n@@ -1 +1 @@\n-x\n+y\n";
    let payload = ChangePayload {
        event: "file_change".into(),
        repository: "demo".into(),
        branch: "main".into(),
        triggered_by: Some(TriggeredBy {
            file: "a.txt".into(),
            event_type: Some(ChangeKind::Modified),
        }),
        staged_changes: DiffSection::new(vec!["a.txt".into()], diff.into()),
        unstaged_changes: DiffSection::default(),
        untracked_files: vec!["notes.md".into()],
        last_commit: Some("abc1234 - init - Dev".into()),
        timestamp: "2026-01-01T00:00:00.000Z".into(),
    };

    let status = tokio::task::spawn_blocking(move || {
        WebhookSink::new(url, Duration::from_secs(5)).deliver(&payload)
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(status, 200);

    let log = read_log(data.path());
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["repository"], "demo");
    assert_eq!(log[0]["has_staged_diff"], true);
    assert_eq!(log[0]["has_unstaged_diff"], false);
    assert_eq!(log[0]["untracked_files"][0], "notes.md");

    let id = log[0]["id"].as_u64().unwrap();
    let blob = std::fs::read_to_string(data.path().join("diffs").join(format!("staged_{id}.diff")))
        .unwrap();
    assert_eq!(blob, diff);
}

#[tokio::test]
async fn send_once_reports_a_real_working_tree() {
    let data = tempfile::tempdir().unwrap();
    let url = spawn_receiver(data.path()).await;

    let repo = tempfile::tempdir().unwrap();
    git(repo.path(), &["-c", "init.defaultBranch=main", "init", "-q"]);
    git(repo.path(), &["config", "user.email", "dev@example.com"]);
    git(repo.path(), &["config", "user.name", "Dev"]);
    git(repo.path(), &["config", "commit.gpgsign", "false"]);
    std::fs::write(repo.path().join("a.txt"), "one\n").unwrap();
    git(repo.path(), &["add", "a.txt"]);
    git(repo.path(), &["commit", "-q", "-m", "init"]);
    std::fs::write(repo.path().join("a.txt"), "two\n").unwrap();
    std::fs::write(repo.path().join("new.txt"), "fresh\n").unwrap();

    let config = WatchConfig {
        repo_path: repo.path().to_path_buf(),
        webhook_url: url,
        timeout_secs: 5,
        ..Default::default()
    };
    let outcome = tokio::task::spawn_blocking(move || autodocs_watch::send_once(&config))
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, FlushOutcome::Delivered { status: 200 }), "{outcome:?}");

    let log = read_log(data.path());
    assert_eq!(log.len(), 1);
    let entry = &log[0];
    assert_eq!(entry["branch"], "main");
    assert_eq!(entry["unstaged_files"][0], "a.txt");
    assert_eq!(entry["untracked_files"][0], "new.txt");
    assert_eq!(entry["has_unstaged_diff"], true);
    assert_eq!(entry["has_staged_diff"], false);
    assert!(entry["last_commit"].as_str().unwrap().contains("init"));

    let id = entry["id"].as_u64().unwrap();
    let blob = std::fs::read_to_string(
        data.path().join("diffs").join(format!("unstaged_{id}.diff")),
    )
    .unwrap();
    assert!(blob.contains("+two"));
}
