use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "autodocs.json";

/// Maximum number of entries kept in the receiver log.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

// ── Watcher ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Root of the git working tree to observe.
    pub repo_path: PathBuf,
    /// Receiver endpoint for change payloads.
    pub webhook_url: String,
    pub debounce_ms: u64,
    /// Outbound request timeout.
    pub timeout_secs: u64,
    /// Extra glob patterns (relative to the repo root) to ignore.
    pub ignore: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            webhook_url: "http://localhost:3000/autodocs/git".to_string(),
            debounce_ms: 2000,
            timeout_secs: 10,
            ignore: Vec::new(),
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Receiver ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
    /// Directory holding `webhook-logs.json` and `diffs/`.
    pub data_dir: PathBuf,
    pub log_capacity: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            data_dir: PathBuf::from("."),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl ServeConfig {
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("webhook-logs.json")
    }

    pub fn diff_dir(&self) -> PathBuf {
        self.data_dir.join("diffs")
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

// ── Top level ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutodocsConfig {
    pub watch: WatchConfig,
    pub serve: ServeConfig,
}

impl AutodocsConfig {
    /// Read a config file. A missing file yields defaults; an unreadable or
    /// malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
    }

    /// Load `explicit` if given, otherwise `autodocs.json` under `cwd`.
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("config file not found: {}", path.display());
                }
                Self::load(path)
            }
            None => Self::load(&cwd.join(DEFAULT_CONFIG_FILE)),
        }
    }
}
