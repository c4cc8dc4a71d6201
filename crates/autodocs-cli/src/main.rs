mod cmd_send;
mod cmd_serve;
mod cmd_watch;

use std::path::{Path, PathBuf};

use autodocs_core::config::DEFAULT_CONFIG_FILE;
use autodocs_core::AutodocsConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "autodocs",
    version,
    about = "Watch a git working tree and collect its diffs"
)]
struct Cli {
    /// Config file (default: ./autodocs.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch a repository and POST its state after each burst of changes
    Watch {
        /// Repository root to watch
        #[arg(long)]
        repo: Option<PathBuf>,
        /// Webhook endpoint
        #[arg(long)]
        url: Option<String>,
        /// Quiet period before a flush, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Receive change payloads and serve the dashboard
    Serve {
        /// Address to bind
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Directory for webhook-logs.json and diffs/
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Snapshot the repository once and POST it
    Send {
        /// Repository root
        #[arg(long)]
        repo: Option<PathBuf>,
        /// Webhook endpoint
        #[arg(long)]
        url: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Config file values with this invocation's flags applied on top.
fn resolve_config(cli: &Cli, cwd: &Path) -> anyhow::Result<AutodocsConfig> {
    let mut config = AutodocsConfig::resolve(cli.config.as_deref(), cwd)?;
    match &cli.cmd {
        Command::Watch {
            repo,
            url,
            debounce_ms,
        } => {
            if let Some(repo) = repo {
                config.watch.repo_path = repo.clone();
            }
            if let Some(url) = url {
                config.watch.webhook_url = url.clone();
            }
            if let Some(ms) = debounce_ms {
                config.watch.debounce_ms = *ms;
            }
        }
        Command::Serve {
            bind,
            port,
            data_dir,
        } => {
            if let Some(bind) = bind {
                config.serve.bind = bind.clone();
            }
            if let Some(port) = port {
                config.serve.port = *port;
            }
            if let Some(dir) = data_dir {
                config.serve.data_dir = dir.clone();
            }
        }
        Command::Send { repo, url } => {
            if let Some(repo) = repo {
                config.watch.repo_path = repo.clone();
            }
            if let Some(url) = url {
                config.watch.webhook_url = url.clone();
            }
        }
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cwd = std::env::current_dir()?;
    let config = resolve_config(&cli, &cwd)?;
    tracing::debug!(
        file = %cli
            .config
            .clone()
            .unwrap_or_else(|| cwd.join(DEFAULT_CONFIG_FILE))
            .display(),
        "configuration resolved"
    );

    match cli.cmd {
        Command::Watch { .. } => {
            tracing::info!(
                repo = %config.watch.repo_path.display(),
                url = %config.watch.webhook_url,
                debounce_ms = config.watch.debounce_ms,
                "starting watcher"
            );
            cmd_watch::execute(config.watch)
        }
        Command::Serve { .. } => {
            tracing::info!(
                addr = %config.serve.addr(),
                data_dir = %config.serve.data_dir.display(),
                "starting webhook server"
            );
            cmd_serve::execute(config.serve)
        }
        Command::Send { .. } => {
            tracing::info!(
                repo = %config.watch.repo_path.display(),
                url = %config.watch.webhook_url,
                "sending one snapshot"
            );
            cmd_send::execute(&config.watch)
        }
    }
}
