//! Entry point for the vacancy checker.
//!
//! Each invocation performs one polling pass over the configured parks,
//! alerts on newly opened campsites, and persists what it has announced.
//! Scheduling is left to cron or a CI workflow.

use anyhow::Context;
use campground_scan::{AppConfig, RunMode, StateStore, run};
use chrono::Utc;
use clap::Parser;

mod cli;
mod services;

use cli::Cli;
use services::{Credentials, build_dispatcher, build_source};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let mode = cli.mode();
    log::info!("🏕 Starting vacancy check ({:?})", mode);

    let config = AppConfig::from_path(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let credentials = Credentials::from_env(mode, cli.mock_notify)?;

    let source = build_source(&cli, &credentials).context("Failed to set up availability source")?;
    let mock_notify = cli.mock_notify || mode == RunMode::DryRun;
    let dispatcher = build_dispatcher(&config, &credentials, mock_notify)
        .await
        .context("Failed to set up notifications")?;
    let store = StateStore::new(cli.state_file.clone());

    let outcome = run(&config, mode, &*source, &dispatcher, &store, Utc::now())
        .await
        .context("Vacancy check failed")?;

    log::info!("✅ {}", outcome.report);
    if let Some(delivery) = outcome.delivery {
        log::info!(
            "📧 Alert delivered (email {}, push {})",
            delivery.email_id,
            delivery.push_id.as_deref().unwrap_or("withheld")
        );
    }
    Ok(())
}
