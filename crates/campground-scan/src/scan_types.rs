use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A campsite reported as available by the availability source.
///
/// Observations are produced fresh on every poll and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Campsite identifier, unique within the reservation system
    pub site_id: String,
    /// Campground (facility) the site belongs to
    pub campground_id: String,
    /// Display name of the site
    pub name: String,
    /// Park the site was found under
    pub park: String,
    /// Nights on which the site is available, in ascending order
    pub available_dates: Vec<NaiveDate>,
    /// Booking page for the site
    pub url: String,
}

impl Site {
    /// Whether any available night falls inside `range`.
    pub fn is_open_during(&self, range: &DateRange) -> bool {
        self.available_dates.iter().any(|date| range.contains(*date))
    }
}

/// Half-open span of nights `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_range_order"))]
pub struct DateRange {
    /// First night of the stay
    pub start: NaiveDate,
    /// Check-out day (not a night of the stay)
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a new date range
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `start <= date < end`
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

fn validate_range_order(range: &DateRange) -> Result<(), validator::ValidationError> {
    if range.start < range.end {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_date_range"))
    }
}

/// A park and the stays being watched there.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WatchTarget {
    /// Human-readable park name, e.g. "Yosemite National Park"
    #[validate(length(min = 1, message = "Park name is required"))]
    pub park: String,

    /// Inactive targets are skipped entirely
    #[serde(default)]
    pub active: bool,

    /// Stays to watch, in the order alerts should list them
    #[validate(nested)]
    pub date_ranges: Vec<DateRange>,
}

/// Display metadata for a vacancy, as shown in alerts and stored in state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VacancyInfo {
    /// Park name
    #[serde(default)]
    pub park: String,
    /// Site display name
    #[serde(default)]
    pub name: String,
    /// Human-readable date range, e.g. "2025-07-01 to 2025-07-07"
    #[serde(default)]
    pub dates: String,
    /// Booking URL
    #[serde(default)]
    pub url: String,
}

impl VacancyInfo {
    /// Build the display metadata for `site` being open during `range`.
    pub fn for_site(park: &str, site: &Site, range: &DateRange) -> Self {
        Self {
            park: park.to_string(),
            name: site.name.clone(),
            dates: range.to_string(),
            url: site.url.clone(),
        }
    }
}

/// Custom error type for scan operations
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Resource not found upstream
    #[error("Not found")]
    NotFound,

    /// API error
    #[error("API error: {0}")]
    ApiError(String),

    /// Rate limited by external API
    #[error("Rate limited by external API")]
    RateLimited,

    /// Authentication failed with external service
    #[error("Authentication failed with external service")]
    AuthenticationFailed,

    /// Data format error
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Local I/O error (fixtures, caches)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
