//! Path filtering for the watcher.
//!
//! Two layers, checked in order:
//! 1. Built-in rules (always active): hidden components and dependency/build dirs
//! 2. Extra glob patterns from configuration

use std::path::{Component, Path};

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Directory names ignored at any depth.
pub const IGNORED_DIRS: &[&str] = &["node_modules", "__pycache__", ".venv", "dist", "build"];

pub struct IgnoreRules {
    extra: GlobSet,
}

impl IgnoreRules {
    /// Compile the extra patterns. Patterns are matched against paths
    /// relative to the watched root.
    pub fn new(patterns: &[String]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            extra: builder.build()?,
        })
    }

    /// `rel` must be relative to the watched root.
    pub fn is_ignored(&self, rel: &Path) -> bool {
        if is_builtin_ignored(rel) {
            return true;
        }
        self.extra.is_match(rel)
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            extra: GlobSet::empty(),
        }
    }
}

fn is_builtin_ignored(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || IGNORED_DIRS.contains(&name.as_ref())
        }
        _ => false,
    })
}
