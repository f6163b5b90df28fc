use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::scan_types::VacancyInfo;
use crate::vacancy_key::VacancyKey;

/// Vacancies that have been open for this long since their last alert are announced again.
pub const DEFAULT_REALERT_AFTER: Duration = Duration::hours(24);

/// Persisted knowledge about one vacancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyRecord {
    /// When the vacancy was last announced (reset on every re-alert)
    #[serde(with = "iso8601")]
    pub first_alerted: DateTime<Utc>,

    /// Display metadata shown in alerts
    #[serde(flatten)]
    pub info: VacancyInfo,
}

/// Mapping from vacancy key to what we know about it.
///
/// Everything except [`StateStore::load`] and [`StateStore::save`] works purely
/// in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyState(BTreeMap<VacancyKey, VacancyRecord>);

impl VacancyState {
    /// Empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked vacancies
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no vacancy is tracked
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up the record for `key`
    pub fn get(&self, key: &VacancyKey) -> Option<&VacancyRecord> {
        self.0.get(key)
    }

    /// Iterate over tracked keys in order
    pub fn keys(&self) -> impl Iterator<Item = &VacancyKey> {
        self.0.keys()
    }

    /// Iterate over tracked entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&VacancyKey, &VacancyRecord)> {
        self.0.iter()
    }

    /// True iff the vacancy has never been announced (or was pruned since).
    pub fn is_new(&self, key: &VacancyKey) -> bool {
        !self.0.contains_key(key)
    }

    /// True iff the vacancy is tracked and its last alert is at least `threshold` old.
    pub fn is_realert_due(&self, key: &VacancyKey, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.0.get(key) {
            Some(record) => now - record.first_alerted >= threshold,
            None => false,
        }
    }

    /// Start tracking a vacancy, overwriting any previous record.
    pub fn record_first_alert(&mut self, key: VacancyKey, info: VacancyInfo, now: DateTime<Utc>) {
        self.0.insert(
            key,
            VacancyRecord {
                first_alerted: now,
                info,
            },
        );
    }

    /// Restart the re-alert clock, keeping the display metadata.
    ///
    /// Returns `false` when the key is not tracked.
    pub fn reset_alert_timer(&mut self, key: &VacancyKey, now: DateTime<Utc>) -> bool {
        match self.0.get_mut(key) {
            Some(record) => {
                record.first_alerted = now;
                true
            }
            None => false,
        }
    }

    /// Drop every vacancy not in `observed`.
    pub fn prune(self, observed: &BTreeSet<VacancyKey>) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|(key, _)| observed.contains(key))
                .collect(),
        )
    }
}

/// Errors raised while persisting state
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Filesystem error
    #[error("State I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON file holding the [`VacancyState`] between runs.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state.
    ///
    /// A missing or malformed file yields an empty state; this never fails.
    pub fn load(&self) -> VacancyState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", self.path.display());
                return VacancyState::new();
            }
            Err(e) => {
                warn!("Could not read state file {}: {}", self.path.display(), e);
                return VacancyState::new();
            }
        };

        match serde_json::from_str::<VacancyState>(&raw) {
            Ok(state) => {
                debug!("Loaded {} tracked vacancies", state.len());
                state
            }
            Err(e) => {
                warn!(
                    "State file {} is malformed, starting empty: {}",
                    self.path.display(),
                    e
                );
                VacancyState::new()
            }
        }
    }

    /// Replace the persisted state with `state`.
    ///
    /// The file is written to a temporary sibling and renamed into place, so a
    /// crash mid-write leaves the previous state intact.
    pub fn save(&self, state: &VacancyState) -> Result<(), StateError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, state)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StateError::Io(e.error))?;

        info!(
            "Saved {} tracked vacancies to {}",
            state.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Parse an ISO-8601 timestamp; offset-naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SS[.ffffff]+00:00`.
///
/// The fraction is written with microsecond precision and omitted when zero.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    let format = if ts.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    ts.to_rfc3339_opts(format, false)
}

mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}
