use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BAGTRACK_LOG";

pub struct DiagnosticsSession {
    path: Option<PathBuf>,
}

impl DiagnosticsSession {
    /// Installs the global subscriber. Without diagnostics, warnings go to
    /// stderr; with them, everything down to debug goes to a fresh file in
    /// `log_dir`.
    pub fn initialize(enabled: bool, log_dir: &Path) -> Result<Self> {
        let default_level = if enabled { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

        if !enabled {
            // A subscriber already installed in this process keeps logging.
            if let Err(error) = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
            {
                tracing::debug!(%error, "stderr logger already installed");
            }
            return Ok(Self { path: None });
        }

        fs::create_dir_all(log_dir)
            .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
        let stamp = bagtrack_core::time::file_stamp(bagtrack_core::time::now_utc())
            .context("failed to format diagnostics timestamp")?;
        let path = log_dir.join(format!("bagtrack-{stamp}.log"));
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to create diagnostics log at {}", path.display()))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .try_init()
            .map_err(|error| anyhow!("failed to install diagnostics logger: {error}"))?;

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            pid = std::process::id(),
            argv = ?std::env::args().collect::<Vec<String>>(),
            "bagtrack diagnostics start"
        );

        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Logs live next to the store directory.
pub fn log_dir_for(store_dir: &Path) -> PathBuf {
    store_dir
        .parent()
        .unwrap_or(store_dir)
        .join("logs")
}
