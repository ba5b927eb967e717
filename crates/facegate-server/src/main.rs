//! Facegate - main entry point

use anyhow::{Context, Result};
use clap::Parser;
use facegate_common::logging::{init_logging, LogConfig, LogLevel};
use facegate_server::{
    audit::SqliteAuditStore,
    server::{shutdown_signal, Server},
    session::SessionContext,
    Cli,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let base = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .log_file_prefix("facegate")
        .build();

    // Environment variables take precedence over the defaults above
    let log_config = match LogConfig::from_env_or(base.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring LOG_* settings: {e:#}");
            base
        }
    };
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Gateway terminated");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;

    let store = SqliteAuditStore::open(&config.database.path).with_context(|| {
        format!("Cannot open audit store at {}", config.database.path.display())
    })?;
    info!(path = %config.database.path.display(), "Audit store ready");

    let ctx = SessionContext::from_config(&config, Arc::new(store));
    let server = Server::from_config(&config, ctx).await?;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });

    server.run(shutdown).await?;
    info!("Gateway shut down gracefully");

    Ok(())
}
