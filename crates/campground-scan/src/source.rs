use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::scan_types::{DateRange, ScanError, Site};

/// Anything that can report which campsites are open for a park.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Sites in `park` with at least one available night in any of `date_ranges`.
    async fn get_available_sites(
        &self,
        park: &str,
        date_ranges: &[DateRange],
    ) -> Result<Vec<Site>, ScanError>;
}

/// Canned availability read from a JSON file, used for dry runs.
///
/// The file maps park names to lists of sites.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    sites_by_park: HashMap<String, Vec<Site>>,
}

impl FixtureSource {
    /// Build a fixture source from already-parsed data
    pub fn new(sites_by_park: HashMap<String, Vec<Site>>) -> Self {
        Self { sites_by_park }
    }

    /// Load fixture data from `path`
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let raw = fs::read_to_string(path)?;
        let sites_by_park = serde_json::from_str(&raw).map_err(|e| {
            ScanError::DataFormat(format!("Invalid fixture file {}: {}", path.display(), e))
        })?;
        Ok(Self { sites_by_park })
    }
}

#[async_trait]
impl AvailabilitySource for FixtureSource {
    async fn get_available_sites(
        &self,
        park: &str,
        _date_ranges: &[DateRange],
    ) -> Result<Vec<Site>, ScanError> {
        let sites = self.sites_by_park.get(park).cloned().unwrap_or_default();
        debug!("Fixture has {} sites for {}", sites.len(), park);
        Ok(sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_source_reads_parks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample_availability.json");
        fs::write(
            &path,
            r#"{"Yosemite National Park": [{
                "site_id": "fixture_001",
                "campground_id": "232447",
                "name": "Curry Village Cabin #4",
                "park": "Yosemite National Park",
                "available_dates": ["2025-07-03", "2025-07-04"],
                "url": "https://www.recreation.gov/camping/campsites/fixture_001"
            }]}"#,
        )
        .unwrap();

        let source = FixtureSource::from_path(&path).unwrap();
        let sites = source
            .get_available_sites("Yosemite National Park", &[])
            .await
            .unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].site_id, "fixture_001");

        let none = source.get_available_sites("Zion", &[]).await.unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_fixture_source_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "[]").unwrap();

        assert!(matches!(
            FixtureSource::from_path(&path),
            Err(ScanError::DataFormat(_))
        ));
        assert!(matches!(
            FixtureSource::from_path(&dir.path().join("missing.json")),
            Err(ScanError::Io(_))
        ));
    }
}
