use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Durable identity of a (site, date range) vacancy.
///
/// Rendered as `{site_id}_{start}_{end}` with ISO dates. Dates never contain
/// `_`, so the last two segments always hold the range bounds even when the
/// site identifier itself contains underscores.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyKey(String);

impl VacancyKey {
    /// The key as stored in the state file
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the key back into `(site_id, start, end)`.
    ///
    /// Returns `None` for keys that were not produced by [`derive_key`].
    pub fn parts(&self) -> Option<(&str, NaiveDate, NaiveDate)> {
        let mut segments = self.0.rsplitn(3, '_');
        let end = NaiveDate::parse_from_str(segments.next()?, DATE_FORMAT).ok()?;
        let start = NaiveDate::parse_from_str(segments.next()?, DATE_FORMAT).ok()?;
        let site_id = segments.next()?;
        Some((site_id, start, end))
    }
}

impl fmt::Display for VacancyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VacancyKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Derive the state key for `site_id` being open during `[range_start, range_end)`.
pub fn derive_key(site_id: &str, range_start: NaiveDate, range_end: NaiveDate) -> VacancyKey {
    VacancyKey(format!(
        "{}_{}_{}",
        site_id,
        range_start.format(DATE_FORMAT),
        range_end.format(DATE_FORMAT)
    ))
}
