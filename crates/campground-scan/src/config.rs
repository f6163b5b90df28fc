use std::fs;
use std::path::Path;

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::quiet_hours::QuietHours;
use crate::reconciler::ReconcileOptions;
use crate::scan_types::WatchTarget;
use crate::state_store::DEFAULT_REALERT_AFTER;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid YAML for [`AppConfig`]
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Config values failed validation
    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Timezone name not in the IANA database
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Required environment variable is missing
    #[error("{0} environment variable not set")]
    MissingEnv(String),
}

/// Where and how alerts are delivered
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotificationSettings {
    /// Recipient address for alert emails
    #[validate(email(message = "Notification email is not a valid address"))]
    pub email: String,

    /// IANA timezone used for quiet hours, e.g. "America/Los_Angeles"
    #[validate(custom(function = "validate_timezone"))]
    pub timezone: String,

    /// Push quiet window; defaults to 23:00-06:00
    #[serde(default)]
    #[validate(nested)]
    pub quiet_hours: Option<QuietHours>,
}

impl NotificationSettings {
    /// Parsed timezone
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }
}

/// Contents of `config.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Alert delivery settings
    #[validate(nested)]
    pub notifications: NotificationSettings,

    /// Parks and stays to watch
    #[serde(default)]
    #[validate(nested)]
    pub targets: Vec<WatchTarget>,

    /// Hours before a still-open vacancy is announced again (default 24)
    #[serde(default)]
    #[validate(range(min = 1, message = "realert_hours must be positive"))]
    pub realert_hours: Option<i64>,

    /// Keep a park's tracked vacancies when fetching it fails
    #[serde(default)]
    pub retain_on_fetch_error: bool,
}

impl AppConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the config file at `path`
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Reconciliation tuning derived from the config
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            realert_after: self
                .realert_hours
                .map(Duration::hours)
                .unwrap_or(DEFAULT_REALERT_AFTER),
            retain_on_fetch_error: self.retain_on_fetch_error,
        }
    }
}

fn validate_timezone(timezone: &str) -> Result<(), validator::ValidationError> {
    match timezone.parse::<Tz>() {
        Ok(_) => Ok(()),
        Err(_) => Err(validator::ValidationError::new("unknown_timezone")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
notifications:
  email: me@example.com
  timezone: America/Los_Angeles
  quiet_hours:
    start: "23:00"
    end: "06:00"
targets:
  - park: Yosemite National Park
    active: true
    date_ranges:
      - start: 2025-07-01
        end: 2025-07-07
      - start: 2025-08-01
        end: 2025-08-05
  - park: Zion National Park
    date_ranges: []
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = AppConfig::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(config.targets.len(), 2);
        assert!(config.targets[0].active);
        assert!(!config.targets[1].active);
        assert_eq!(config.targets[0].date_ranges[1].to_string(), "2025-08-01 to 2025-08-05");
        assert_eq!(config.notifications.tz().unwrap(), chrono_tz::America::Los_Angeles);
        assert_eq!(config.reconcile_options().realert_after, Duration::hours(24));
        assert!(!config.reconcile_options().retain_on_fetch_error);
    }

    #[test]
    fn test_realert_hours_override() {
        let raw = format!("{}realert_hours: 6\nretain_on_fetch_error: true\n", SAMPLE);
        let config = AppConfig::from_yaml_str(&raw).unwrap();

        assert_eq!(config.reconcile_options().realert_after, Duration::hours(6));
        assert!(config.reconcile_options().retain_on_fetch_error);
    }

    #[test]
    fn test_rejects_inverted_date_range() {
        let raw = SAMPLE.replace("end: 2025-07-07", "end: 2025-06-07");
        assert!(matches!(
            AppConfig::from_yaml_str(&raw),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let raw = SAMPLE.replace("America/Los_Angeles", "Mars/Olympus_Mons");
        assert!(matches!(
            AppConfig::from_yaml_str(&raw),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_bad_email() {
        let raw = SAMPLE.replace("me@example.com", "not-an-address");
        assert!(matches!(
            AppConfig::from_yaml_str(&raw),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        assert!(matches!(
            AppConfig::from_yaml_str("notifications: [unterminated"),
            Err(ConfigError::Parse(_))
        ));
    }
}
