//! Narrow view of a git working tree: "given a repo path, return
//! branch/diffs/file lists or fail". Everything goes through the `git` CLI.

pub mod repo;
pub mod runner;

pub use repo::{repository_name, GitError, GitRepo, RepoSnapshot, RepoState};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
