use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use campground_scan::{ScanError, format_timestamp, parse_timestamp};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Default cache location, relative to the working directory
pub const DEFAULT_CACHE_FILE: &str = "cache/park_lookup.json";

/// Default lifetime of a cached lookup
pub const DEFAULT_CACHE_TTL: Duration = Duration::hours(24);

/// Cached campground ids for one park
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkCacheEntry {
    /// Campground (facility) ids found for the park
    pub ids: Vec<String>,
    /// ISO timestamp of the lookup; offset-less values are read as UTC
    pub fetched_at: String,
}

/// Park name to campground id lookups persisted as JSON.
#[derive(Debug, Clone)]
pub struct ParkCache {
    path: PathBuf,
    ttl: Duration,
}

impl ParkCache {
    /// Cache stored at `path` with the default TTL
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the entry lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Location of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fresh ids for `park`, or `None` when missing or expired.
    pub fn lookup(&self, park: &str, now: DateTime<Utc>) -> Option<Vec<String>> {
        let entries = self.load();
        let entry = entries.get(park)?;
        if self.is_expired(&entry.fetched_at, now) {
            debug!("Park cache entry for {} has expired", park);
            return None;
        }
        Some(entry.ids.clone())
    }

    /// Record `ids` for `park` as fetched at `now`.
    pub fn store(&self, park: &str, ids: &[String], now: DateTime<Utc>) -> Result<(), ScanError> {
        let mut entries = self.load();
        entries.insert(
            park.to_string(),
            ParkCacheEntry {
                ids: ids.to_vec(),
                fetched_at: format_timestamp(&now),
            },
        );

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| ScanError::DataFormat(format!("Failed to encode park cache: {}", e)))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| ScanError::Io(e.error))?;
        Ok(())
    }

    /// All entries; a missing or unreadable file is an empty cache.
    pub fn load(&self) -> BTreeMap<String, ParkCacheEntry> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!("Could not read park cache {}: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring corrupt park cache {}: {}", self.path.display(), e);
            BTreeMap::new()
        })
    }

    /// Entries older than the TTL, or with an unparseable timestamp, are expired.
    fn is_expired(&self, fetched_at: &str, now: DateTime<Utc>) -> bool {
        match parse_timestamp(fetched_at) {
            Some(fetched) => now - fetched > self.ttl,
            None => true,
        }
    }
}
