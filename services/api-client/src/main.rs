//! API client
//!
//! Command-line client for a bearer-token API:
//! 1. Loads config and the persisted session
//! 2. Runs one subcommand (login, logout, request, ...)
//! 3. Requests go through the refresh guard, so an expired access token is
//!    refreshed once and the request replayed without the user noticing
//!
//! Logs go to stderr as JSON; command output goes to stdout.

mod app;
mod cli;
mod config;
mod metrics;
mod navigator;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use session_auth::FileCredentialStore;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::ReqwestTransport;

use crate::app::App;
use crate::cli::Cli;
use crate::config::Config;
use crate::navigator::TerminalNavigator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    // Install before any component can record a counter
    let prometheus_handle = metrics::install_recorder()?;

    let config_path = Config::resolve_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        refresh_timeout_secs = ?config.auth.refresh_timeout_secs,
        store = %config.store.path.display(),
        "configuration loaded"
    );

    let store = Arc::new(
        FileCredentialStore::load(config.store.path.clone())
            .await
            .with_context(|| {
                format!("failed to load session from {}", config.store.path.display())
            })?,
    );
    let transport = ReqwestTransport::new(config.request_timeout())
        .context("failed to build HTTP client")?;

    let app = App::new(
        &config,
        Arc::new(transport),
        store.clone(),
        Arc::new(TerminalNavigator),
    );

    let result = app.run(cli.command).await;

    // The session file is written in the background; let it catch up
    store.flush().await;

    if cli.print_metrics {
        eprintln!("{}", prometheus_handle.render());
    }

    println!("{}", result?);
    Ok(())
}
