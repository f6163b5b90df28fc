use std::path::PathBuf;

use campground_scan::RunMode;
use clap::Parser;

/// National park vacancy checker
#[derive(Debug, Parser)]
#[command(name = "vacancy_checker", version)]
pub struct Cli {
    /// Use fixture data, print alerts, do not send or save state
    #[arg(long, conflicts_with = "test_notify")]
    pub dry_run: bool,

    /// Send a real test notification immediately
    #[arg(long)]
    pub test_notify: bool,

    /// Log notifications instead of delivering them
    #[arg(long)]
    pub mock_notify: bool,

    /// Path to the YAML configuration
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Path to the persisted vacancy state
    #[arg(long, default_value = "state.json")]
    pub state_file: PathBuf,

    /// Availability fixture used by --dry-run
    #[arg(long, default_value = "fixtures/sample_availability.json")]
    pub fixtures: PathBuf,

    /// Park lookup cache used for live runs
    #[arg(long, default_value = rec_gov::DEFAULT_CACHE_FILE)]
    pub park_cache: PathBuf,
}

impl Cli {
    /// Side-effect mode selected by the flags
    pub fn mode(&self) -> RunMode {
        if self.dry_run {
            RunMode::DryRun
        } else if self.test_notify {
            RunMode::TestNotify
        } else {
            RunMode::Live
        }
    }
}
