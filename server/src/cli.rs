//! Command-line arguments. Every flag can also be set from a `REPOVIEW_*`
//! environment variable.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Serve mirrored git repositories read-only over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "repoview-server")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "REPOVIEW_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Directory holding the local clones
    #[arg(long, env = "REPOVIEW_STORAGE_ROOT", default_value = "repos")]
    pub storage_root: PathBuf,

    /// Repository config file [default: <storage-root>/config.yml]
    #[arg(long, env = "REPOVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON table mapping file extensions to languages
    #[arg(long, env = "REPOVIEW_LANGUAGES", default_value = "languages.json")]
    pub languages: PathBuf,

    /// Directory served under /static
    #[arg(long, env = "REPOVIEW_ASSETS")]
    pub assets: Option<PathBuf>,

    /// Seconds between config reloads and repository syncs
    #[arg(long, env = "REPOVIEW_REFRESH_INTERVAL", value_name = "SECS", default_value_t = 3600,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_interval: u64,

    /// Seconds a single clone or update may take
    #[arg(long, env = "REPOVIEW_SYNC_TIMEOUT", value_name = "SECS", default_value_t = 300,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub sync_timeout: u64,

    /// Repositories synced in parallel
    #[arg(long, env = "REPOVIEW_SYNC_CONCURRENCY", default_value_t = 4,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub sync_concurrency: u16,

    /// Log output format
    #[arg(long, env = "REPOVIEW_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Args {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.storage_root.join("config.yml"))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout)
    }
}
