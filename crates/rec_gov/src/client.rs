use std::collections::BTreeMap;

use async_trait::async_trait;
use campground_scan::{AvailabilitySource, DateRange, ScanError, Site};
use chrono::{NaiveDate, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::availability::{
    RecGovInternalAvailabilityResponse, collect_sites, merge_month, months_to_query,
};
use crate::park_cache::ParkCache;

/// RIDB activity id for camping
const CAMPING_ACTIVITY: &str = "9";

/// Client for interacting with recreation.gov API
pub struct RecGovClient {
    client: Client,
    ridb_base_url: String,
    internal_base_url: String,
    api_key: String,
    park_cache: ParkCache,
}

/// Facility search response from recreation.gov
#[derive(Debug, Deserialize)]
pub struct RecGovFacilityResponse {
    /// Matching facilities
    #[serde(rename = "RECDATA", default)]
    pub rec_data: Vec<RecGovFacility>,
}

/// A facility returned by the RIDB search
#[derive(Debug, Deserialize)]
pub struct RecGovFacility {
    /// Facility id, sent by RIDB as either a string or a number
    #[serde(rename = "FacilityID", deserialize_with = "string_or_number")]
    pub facility_id: String,

    /// Facility display name
    #[serde(rename = "FacilityName", default)]
    pub facility_name: Option<String>,
}

impl RecGovClient {
    /// Create a new recreation.gov API client
    pub fn new(api_key: String, park_cache: ParkCache) -> Result<Self, ScanError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ScanError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            ridb_base_url: "https://ridb.recreation.gov/api/v1".to_string(),
            internal_base_url: "https://www.recreation.gov/api".to_string(),
            api_key,
            park_cache,
        })
    }

    /// Campground ids for `park`, served from the cache while it is fresh
    pub async fn get_campground_ids(&self, park: &str) -> Result<Vec<String>, ScanError> {
        let now = Utc::now();
        if let Some(ids) = self.park_cache.lookup(park, now) {
            debug!("Park cache hit for {} ({} campgrounds)", park, ids.len());
            return Ok(ids);
        }

        let ids: Vec<String> = self
            .search_facilities(park)
            .await?
            .into_iter()
            .map(|facility| facility.facility_id)
            .collect();
        info!("Found {} campgrounds for {}", ids.len(), park);

        self.park_cache.store(park, &ids, now)?;
        Ok(ids)
    }

    /// Search RIDB for camping facilities matching `query`
    pub async fn search_facilities(&self, query: &str) -> Result<Vec<RecGovFacility>, ScanError> {
        debug!("Searching facilities with query: {}", query);

        let url = format!("{}/facilities", self.ridb_base_url);
        let params = [
            ("query", query),
            ("activity", CAMPING_ACTIVITY),
            ("full", "true"),
            ("limit", "50"),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| ScanError::Network(format!("Facility search failed: {}", e)))?;

        let facility_response: RecGovFacilityResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                ScanError::DataFormat(format!("Failed to parse facility response: {}", e))
            })?;

        Ok(facility_response.rec_data)
    }

    /// One month of availability for a campground
    pub async fn get_month_availability(
        &self,
        campground_id: &str,
        month_start: NaiveDate,
    ) -> Result<RecGovInternalAvailabilityResponse, ScanError> {
        let url = format!(
            "{}/camps/availability/campground/{}/month",
            self.internal_base_url, campground_id
        );
        let start_date_param = format!("{}T00:00:00.000Z", month_start.format("%Y-%m-%d"));

        debug!("Making request to: {}?start_date={}", url, start_date_param);

        let response = self
            .client
            .get(&url)
            .query(&[("start_date", start_date_param)])
            .send()
            .await
            .map_err(|e| ScanError::Network(format!("HTTP request failed: {}", e)))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ScanError::DataFormat(format!("Failed to parse response: {}", e)))
    }

    /// Point the client at other RIDB and reservation API hosts
    pub fn with_base_urls(mut self, ridb_base_url: &str, internal_base_url: &str) -> Self {
        self.ridb_base_url = ridb_base_url.trim_end_matches('/').to_string();
        self.internal_base_url = internal_base_url.trim_end_matches('/').to_string();
        self
    }

    /// Available sites in one campground.
    ///
    /// A failed month is skipped; the campground fails only when every month does.
    async fn check_campground(
        &self,
        campground_id: &str,
        park: &str,
        date_ranges: &[DateRange],
    ) -> Result<Vec<Site>, ScanError> {
        let mut merged = BTreeMap::new();
        let mut fetched_any = false;
        let mut last_error = None;

        for month_start in months_to_query(date_ranges) {
            match self.get_month_availability(campground_id, month_start).await {
                Ok(response) => {
                    merge_month(&mut merged, response);
                    fetched_any = true;
                }
                Err(e) => {
                    warn!(
                        "Skipping {} for campground {}: {}",
                        month_start.format("%Y-%m"),
                        campground_id,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !fetched_any => Err(e),
            _ => Ok(collect_sites(campground_id, park, merged, date_ranges)),
        }
    }
}

#[async_trait]
impl AvailabilitySource for RecGovClient {
    async fn get_available_sites(
        &self,
        park: &str,
        date_ranges: &[DateRange],
    ) -> Result<Vec<Site>, ScanError> {
        let campground_ids = self.get_campground_ids(park).await?;

        let mut sites = Vec::new();
        let mut checked_any = false;
        let mut last_error = None;
        for campground_id in &campground_ids {
            match self.check_campground(campground_id, park, date_ranges).await {
                Ok(found) => {
                    sites.extend(found);
                    checked_any = true;
                }
                Err(e) => {
                    warn!("Campground {} unavailable for {}: {}", campground_id, park, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !checked_any => Err(e),
            _ => Ok(sites),
        }
    }
}

/// Map non-success statuses onto [`ScanError`]
async fn check_status(response: Response) -> Result<Response, ScanError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    warn!("API request failed with status {}: {}", status, body);
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> ScanError {
    match status.as_u16() {
        429 => ScanError::RateLimited,
        401 | 403 => ScanError::AuthenticationFailed,
        404 => ScanError::NotFound,
        _ => ScanError::ApiError(format!("HTTP {} - {}", status, body)),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            ScanError::RateLimited
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            ScanError::AuthenticationFailed
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, ""),
            ScanError::AuthenticationFailed
        ));
        assert!(matches!(status_error(StatusCode::NOT_FOUND, ""), ScanError::NotFound));
        match status_error(StatusCode::BAD_GATEWAY, "upstream") {
            ScanError::ApiError(msg) => assert!(msg.contains("upstream")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_facility_ids_accept_strings_and_numbers() {
        let response: RecGovFacilityResponse = serde_json::from_str(
            r#"{"RECDATA": [
                {"FacilityID": "232447", "FacilityName": "Upper Pines"},
                {"FacilityID": 232450}
            ]}"#,
        )
        .unwrap();

        let ids: Vec<_> = response.rec_data.into_iter().map(|f| f.facility_id).collect();
        assert_eq!(ids, vec!["232447".to_string(), "232450".to_string()]);
    }

    #[test]
    fn test_empty_facility_response() {
        let response: RecGovFacilityResponse = serde_json::from_str("{}").unwrap();
        assert!(response.rec_data.is_empty());
    }

    #[tokio::test]
    async fn test_cached_park_skips_search() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParkCache::new(dir.path().join("park_lookup.json"));
        cache
            .store("Yosemite National Park", &["232447".to_string()], Utc::now())
            .unwrap();
        let client = RecGovClient::new("test-key".to_string(), cache).unwrap();

        let ids = client.get_campground_ids("Yosemite National Park").await.unwrap();
        assert_eq!(ids, vec!["232447".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_availability_api_fails_the_park() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParkCache::new(dir.path().join("park_lookup.json"));
        cache.store("Yosemite", &["232447".to_string()], Utc::now()).unwrap();
        let client = RecGovClient::new("test-key".to_string(), cache)
            .unwrap()
            .with_base_urls("http://127.0.0.1:1", "http://127.0.0.1:1");
        let july = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
        );

        let result = client.get_available_sites("Yosemite", &[july]).await;

        assert!(matches!(result, Err(ScanError::Network(_))));
    }

    #[tokio::test]
    async fn test_park_without_campgrounds_has_no_sites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParkCache::new(dir.path().join("park_lookup.json"));
        cache.store("Nowhere", &[], Utc::now()).unwrap();
        let client = RecGovClient::new("test-key".to_string(), cache).unwrap();

        let sites = client.get_available_sites("Nowhere", &[]).await.unwrap();
        assert!(sites.is_empty());
    }
}
