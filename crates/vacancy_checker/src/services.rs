use std::sync::Arc;

use campground_scan::{
    AlertDispatcher, AppConfig, AvailabilitySource, ConfigError, EmailService, FixtureSource,
    PushService, RunMode,
};
use notification_services::{MockEmailService, MockPushService, NtfyPushService, SesEmailService};
use rec_gov::{ParkCache, RecGovClient};

use crate::cli::Cli;

/// Sender and topic used when notifications are only logged
const MOCK_FROM_EMAIL: &str = "vacancy-checker@localhost";
const MOCK_NTFY_TOPIC: &str = "vacancy-checker";

/// Secrets read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// RIDB API key; absent in dry-run mode
    pub api_key: Option<String>,
    /// Sender address for alert emails
    pub from_email: String,
    /// ntfy topic for push alerts
    pub ntfy_topic: String,
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env(mode: RunMode, mock_notify: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(mode, mock_notify, |name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`.
    ///
    /// Dry runs need no credentials. Mock notifications need only the API key.
    pub fn from_lookup(
        mode: RunMode,
        mock_notify: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let require = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
        };

        if mode == RunMode::DryRun {
            return Ok(Self {
                api_key: None,
                from_email: MOCK_FROM_EMAIL.to_string(),
                ntfy_topic: MOCK_NTFY_TOPIC.to_string(),
            });
        }

        let api_key = Some(require("RECREATION_GOV_API_KEY")?);
        if mock_notify {
            return Ok(Self {
                api_key,
                from_email: MOCK_FROM_EMAIL.to_string(),
                ntfy_topic: MOCK_NTFY_TOPIC.to_string(),
            });
        }

        Ok(Self {
            api_key,
            from_email: require("FROM_EMAIL")?,
            ntfy_topic: require("NTFY_TOPIC")?,
        })
    }
}

/// Fixture data for dry runs, recreation.gov otherwise
pub fn build_source(
    cli: &Cli,
    credentials: &Credentials,
) -> anyhow::Result<Box<dyn AvailabilitySource>> {
    match &credentials.api_key {
        None => {
            log::info!("📂 Using fixture availability from {}", cli.fixtures.display());
            Ok(Box::new(FixtureSource::from_path(&cli.fixtures)?))
        }
        Some(api_key) => {
            let cache = ParkCache::new(cli.park_cache.clone());
            Ok(Box::new(RecGovClient::new(api_key.clone(), cache)?))
        }
    }
}

/// Wire email and push transports into a dispatcher
pub async fn build_dispatcher(
    config: &AppConfig,
    credentials: &Credentials,
    mock_notify: bool,
) -> anyhow::Result<AlertDispatcher> {
    let (email, push): (Arc<dyn EmailService>, Arc<dyn PushService>) = if mock_notify {
        (Arc::new(MockEmailService), Arc::new(MockPushService))
    } else {
        (
            Arc::new(SesEmailService::new().await),
            Arc::new(NtfyPushService::new()?),
        )
    };

    Ok(AlertDispatcher::new(
        email,
        push,
        credentials.from_email.clone(),
        credentials.ntfy_topic.clone(),
        config.notifications.clone(),
        config.notifications.tz()?,
    ))
}
