pub mod cli;
pub mod diagnostics;
pub mod dispatch;

use anyhow::{Context, Result};
use bagtrack_app::App;
use bagtrack_core::config::{load_config_or_default, resolve_config_path, resolve_store_dir};
use bagtrack_core::store::FileStore;
use clap::Parser;

use crate::cli::Cli;
use crate::diagnostics::{DiagnosticsSession, log_dir_for};

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path().context("failed to resolve config path")?;
    let config = load_config_or_default(&config_path)?;
    let store_dir = resolve_store_dir(&config)?;

    let diagnostics = DiagnosticsSession::initialize(cli.diagnostics, &log_dir_for(&store_dir))?;
    if let Some(path) = diagnostics.path() {
        eprintln!("diagnostics log: {}", path.display());
    }

    let store = FileStore::with_quota(store_dir, config.quota_bytes());
    let app = App::new(&store).with_soft_budget(config.soft_budget_bytes());

    dispatch::run_with_deps(cli, &app)
}
