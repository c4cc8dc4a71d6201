//! HTML rendering of the change log.

use askama::Template;
use autodocs_core::{DiffKind, LogEntry};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Number of entries shown on the dashboard.
pub const DASHBOARD_ENTRIES: usize = 20;

/// Turns log entries (oldest first) into a page.
pub trait DashboardRenderer: Send + Sync {
    fn render(&self, entries: &[LogEntry]) -> Result<String, askama::Error>;
}

pub struct HtmlDashboard {
    pub recent: usize,
}

impl Default for HtmlDashboard {
    fn default() -> Self {
        Self {
            recent: DASHBOARD_ENTRIES,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    total: usize,
    with_staged: usize,
    with_unstaged: usize,
    /// Newest first.
    entries: Vec<EntryView>,
}

struct EntryView {
    repository: String,
    branch: String,
    when: String,
    sections: Vec<SectionView>,
    last_commit: String,
}

struct SectionView {
    class: &'static str,
    title: &'static str,
    files: Vec<String>,
    has_diff: bool,
    diff_href: String,
}

impl SectionView {
    fn new(
        class: &'static str,
        title: &'static str,
        files: &[String],
        diff: Option<(DiffKind, u64)>,
    ) -> Self {
        Self {
            class,
            title,
            files: files.to_vec(),
            has_diff: diff.is_some(),
            diff_href: diff
                .map(|(kind, id)| format!("/autodocs/git/diff/{kind}/{id}"))
                .unwrap_or_default(),
        }
    }
}

impl From<&LogEntry> for EntryView {
    fn from(entry: &LogEntry) -> Self {
        let sections = [
            SectionView::new(
                "staged",
                "Staged Files",
                &entry.staged_files,
                entry.has_staged_diff.then_some((DiffKind::Staged, entry.id)),
            ),
            SectionView::new(
                "unstaged",
                "Unstaged Files",
                &entry.unstaged_files,
                entry.has_unstaged_diff.then_some((DiffKind::Unstaged, entry.id)),
            ),
            SectionView::new("untracked", "Untracked Files", &entry.untracked_files, None),
        ];
        Self {
            repository: entry.repository.clone(),
            branch: entry.branch.clone(),
            when: display_time(&entry.timestamp),
            sections: sections.into_iter().filter(|s| !s.files.is_empty()).collect(),
            last_commit: entry.last_commit.clone().unwrap_or_default(),
        }
    }
}

impl DashboardRenderer for HtmlDashboard {
    fn render(&self, entries: &[LogEntry]) -> Result<String, askama::Error> {
        DashboardTemplate {
            total: entries.len(),
            with_staged: entries.iter().filter(|e| e.has_staged_diff).count(),
            with_unstaged: entries.iter().filter(|e| e.has_unstaged_diff).count(),
            entries: entries.iter().rev().take(self.recent).map(EntryView::from).collect(),
        }
        .render()
    }
}

/// `2026-01-02T03:04:05.678Z` → `2026-01-02 03:04:05 UTC`; anything
/// unparseable is shown as-is.
fn display_time(ts: &str) -> String {
    match OffsetDateTime::parse(ts, &Rfc3339) {
        Ok(t) => {
            let t = t.to_offset(time::UtcOffset::UTC);
            format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
                t.year(),
                u8::from(t.month()),
                t.day(),
                t.hour(),
                t.minute(),
                t.second()
            )
        }
        Err(_) => ts.to_string(),
    }
}
