use std::path::{Path, PathBuf};

use crate::runner::{CommandRunner, SystemRunner};

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run `git {args}`: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`git {args}` exited with {code}: {stderr}")]
    Exit {
        args: String,
        code: String,
        stderr: String,
    },
}

/// Working-tree state captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSnapshot {
    pub branch: String,
    pub staged_diff: String,
    pub unstaged_diff: String,
    pub staged_files: Vec<String>,
    pub unstaged_files: Vec<String>,
    pub untracked_files: Vec<String>,
    /// `<short hash> - <subject> - <author>`
    pub last_commit: String,
}

impl RepoSnapshot {
    /// True when there is a staged diff, an unstaged diff or an untracked file.
    pub fn has_changes(&self) -> bool {
        !self.staged_diff.is_empty()
            || !self.unstaged_diff.is_empty()
            || !self.untracked_files.is_empty()
    }
}

/// Anything that can report the current working-tree state.
pub trait RepoState: Send + Sync {
    fn snapshot(&self) -> Result<RepoSnapshot, GitError>;
}

/// A git working tree queried through the `git` executable.
pub struct GitRepo<R = SystemRunner> {
    root: PathBuf,
    runner: R,
}

impl GitRepo<SystemRunner> {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::with_runner(root, SystemRunner)
    }
}

impl<R: CommandRunner> GitRepo<R> {
    pub fn with_runner(root: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            root: root.into(),
            runner,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Last path component of the root, used as the repository name.
    pub fn name(&self) -> String {
        repository_name(&self.root)
    }

    fn git(&self, args: &[&str]) -> Result<String, GitError> {
        let joined = args.join(" ");
        let out = self
            .runner
            .run("git", args, &self.root)
            .map_err(|source| GitError::Spawn {
                args: joined.clone(),
                source,
            })?;
        if !out.success() {
            return Err(GitError::Exit {
                args: joined,
                code: out
                    .code
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out.stdout)
    }

    fn git_list(&self, args: &[&str]) -> Result<Vec<String>, GitError> {
        Ok(split_lines(&self.git(args)?))
    }

    pub fn branch(&self) -> Result<String, GitError> {
        Ok(self
            .git(&["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string())
    }

    pub fn staged_diff(&self) -> Result<String, GitError> {
        self.git(&["diff", "--cached"])
    }

    pub fn unstaged_diff(&self) -> Result<String, GitError> {
        self.git(&["diff"])
    }

    pub fn staged_files(&self) -> Result<Vec<String>, GitError> {
        self.git_list(&["-c", "core.quotePath=false", "diff", "--cached", "--name-only"])
    }

    pub fn unstaged_files(&self) -> Result<Vec<String>, GitError> {
        self.git_list(&["-c", "core.quotePath=false", "diff", "--name-only"])
    }

    pub fn untracked_files(&self) -> Result<Vec<String>, GitError> {
        self.git_list(&[
            "-c",
            "core.quotePath=false",
            "ls-files",
            "--others",
            "--exclude-standard",
        ])
    }

    pub fn last_commit(&self) -> Result<String, GitError> {
        Ok(self
            .git(&["log", "-1", "--pretty=format:%h - %s - %an"])?
            .trim()
            .to_string())
    }
}

impl<R: CommandRunner> RepoState for GitRepo<R> {
    /// Run every query in order; the first failure aborts the snapshot.
    fn snapshot(&self) -> Result<RepoSnapshot, GitError> {
        let snap = RepoSnapshot {
            branch: self.branch()?,
            staged_diff: self.staged_diff()?,
            unstaged_diff: self.unstaged_diff()?,
            staged_files: self.staged_files()?,
            unstaged_files: self.unstaged_files()?,
            untracked_files: self.untracked_files()?,
            last_commit: self.last_commit()?,
        };
        tracing::debug!(
            branch = %snap.branch,
            staged = snap.staged_files.len(),
            unstaged = snap.unstaged_files.len(),
            untracked = snap.untracked_files.len(),
            "repo snapshot"
        );
        Ok(snap)
    }
}

pub fn repository_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string_lossy().into_owned())
}

fn split_lines(s: &str) -> Vec<String> {
    s.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
