use std::collections::{BTreeMap, BTreeSet, HashMap};

use campground_scan::{DateRange, Site};
use chrono::{Datelike, Months, NaiveDate};
use serde::Deserialize;
use tracing::warn;

/// Booking page prefix for a single campsite
pub const CAMPSITE_URL_BASE: &str = "https://www.recreation.gov/camping/campsites";

/// Response structure from recreation.gov internal availability API
#[derive(Debug, Default, Deserialize)]
pub struct RecGovInternalAvailabilityResponse {
    /// Campsites keyed by campsite id
    #[serde(default)]
    pub campsites: BTreeMap<String, CampsiteAvailabilityData>,
}

/// Campsite availability data from internal API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampsiteAvailabilityData {
    /// Status per night, keyed by an ISO timestamp such as `2025-07-01T00:00:00Z`
    #[serde(default)]
    pub availabilities: HashMap<String, String>,
    /// Site label shown on the reservation site
    pub site: Option<String>,
    /// Loop the site sits on
    #[serde(rename = "loop")]
    pub campsite_loop: Option<String>,
    /// Campsite type, e.g. "STANDARD NONELECTRIC"
    pub campsite_type: Option<String>,
}

/// A campsite's metadata plus its statuses merged across every month fetched.
#[derive(Debug, Clone, Default)]
pub struct MergedCampsite {
    /// Metadata from the first month the site appeared in
    pub meta: CampsiteAvailabilityData,
    /// Status per night across all months
    pub statuses: HashMap<String, String>,
}

/// First-of-month dates covering every night of every range, ascending.
///
/// Months run from each range's start month through its end date inclusive,
/// so a stay ending on the 1st still pulls that month.
pub fn months_to_query(date_ranges: &[DateRange]) -> Vec<NaiveDate> {
    let mut months = BTreeSet::new();
    for range in date_ranges {
        let mut month = first_of_month(range.start);
        while month <= range.end {
            months.insert(month);
            match month.checked_add_months(Months::new(1)) {
                Some(next) => month = next,
                None => break,
            }
        }
    }
    months.into_iter().collect()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Only "Available" counts; every other status is treated as booked.
pub fn is_available(status: &str) -> bool {
    status == "Available"
}

/// Fold one month's response into the per-site accumulator.
pub fn merge_month(
    merged: &mut BTreeMap<String, MergedCampsite>,
    response: RecGovInternalAvailabilityResponse,
) {
    for (site_id, data) in response.campsites {
        let entry = merged.entry(site_id).or_insert_with(|| MergedCampsite {
            meta: CampsiteAvailabilityData {
                availabilities: HashMap::new(),
                ..data.clone()
            },
            statuses: HashMap::new(),
        });
        entry.statuses.extend(data.availabilities);
    }
}

/// Turn merged campsites into observations for `park`.
///
/// A night qualifies when its status is available and it lies in any of
/// `date_ranges`. Sites without a qualifying night are dropped.
pub fn collect_sites(
    campground_id: &str,
    park: &str,
    merged: BTreeMap<String, MergedCampsite>,
    date_ranges: &[DateRange],
) -> Vec<Site> {
    let mut sites = Vec::new();

    for (site_id, campsite) in merged {
        let mut available_dates: Vec<NaiveDate> = campsite
            .statuses
            .iter()
            .filter(|(_, status)| is_available(status))
            .filter_map(|(timestamp, _)| parse_night(timestamp))
            .filter(|night| date_ranges.iter().any(|range| range.contains(*night)))
            .collect();

        if available_dates.is_empty() {
            continue;
        }
        available_dates.sort();
        available_dates.dedup();

        sites.push(Site {
            name: campsite
                .meta
                .site
                .clone()
                .unwrap_or_else(|| format!("Site {}", site_id)),
            url: format!("{}/{}", CAMPSITE_URL_BASE, site_id),
            campground_id: campground_id.to_string(),
            park: park.to_string(),
            available_dates,
            site_id,
        });
    }

    sites
}

fn parse_night(timestamp: &str) -> Option<NaiveDate> {
    let day = timestamp.get(..10)?;
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("Failed to parse date: {}", timestamp);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn response(json: &str) -> RecGovInternalAvailabilityResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_months_to_query() {
        let ranges = [
            DateRange::new(date(2025, 7, 28), date(2025, 8, 2)),
            DateRange::new(date(2025, 8, 10), date(2025, 8, 12)),
            DateRange::new(date(2025, 12, 30), date(2026, 1, 1)),
        ];

        assert_eq!(
            months_to_query(&ranges),
            vec![
                date(2025, 7, 1),
                date(2025, 8, 1),
                date(2025, 12, 1),
                date(2026, 1, 1),
            ]
        );
        assert!(months_to_query(&[]).is_empty());
    }

    #[test]
    fn test_is_available() {
        assert!(is_available("Available"));
        assert!(!is_available("Reserved"));
        assert!(!is_available("Not Available"));
        assert!(!is_available("Not Reservable"));
        assert!(!is_available("Walk-up"));
        assert!(!is_available("available"));
    }

    #[test]
    fn test_merge_and_collect_across_months() {
        let mut merged = BTreeMap::new();
        merge_month(
            &mut merged,
            response(
                r#"{"campsites": {
                    "100": {"site": "A01", "loop": "North", "availabilities": {
                        "2025-07-30T00:00:00Z": "Available",
                        "2025-07-31T00:00:00Z": "Reserved"
                    }},
                    "200": {"availabilities": {"2025-07-31T00:00:00Z": "Reserved"}}
                }}"#,
            ),
        );
        merge_month(
            &mut merged,
            response(
                r#"{"campsites": {
                    "100": {"site": "ignored", "availabilities": {
                        "2025-08-01T00:00:00Z": "Available",
                        "2025-08-05T00:00:00Z": "Available"
                    }},
                    "300": {"availabilities": {"2025-08-01T00:00:00Z": "Available"}}
                }}"#,
            ),
        );

        let ranges = [DateRange::new(date(2025, 7, 30), date(2025, 8, 2))];
        let sites = collect_sites("232447", "Yosemite", merged, &ranges);

        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].site_id, "100");
        assert_eq!(sites[0].name, "A01");
        assert_eq!(sites[0].campground_id, "232447");
        assert_eq!(sites[0].available_dates, vec![date(2025, 7, 30), date(2025, 8, 1)]);
        assert_eq!(
            sites[0].url,
            "https://www.recreation.gov/camping/campsites/100"
        );
        assert_eq!(sites[1].site_id, "300");
        assert_eq!(sites[1].name, "Site 300");
    }

    #[test]
    fn test_checkout_day_does_not_qualify() {
        let mut merged = BTreeMap::new();
        merge_month(
            &mut merged,
            response(
                r#"{"campsites": {"100": {"availabilities": {
                    "2025-07-07T00:00:00Z": "Available",
                    "garbage": "Available"
                }}}}"#,
            ),
        );

        let ranges = [DateRange::new(date(2025, 7, 1), date(2025, 7, 7))];
        assert!(collect_sites("1", "Yosemite", merged, &ranges).is_empty());
    }

    #[test]
    fn test_missing_campsites_field() {
        assert!(response("{}").campsites.is_empty());
    }
}
