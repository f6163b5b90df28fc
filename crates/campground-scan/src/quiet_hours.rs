use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default start of the quiet window (11 PM)
pub const QUIET_START: u32 = 23;
/// Default end of the quiet window (6 AM)
pub const QUIET_END: u32 = 6;

/// Whether `now`, seen on the wall clock of `tz`, falls in quiet hours.
///
/// The window wraps midnight: quiet iff `hour >= start_hour || hour < end_hour`.
pub fn is_quiet_hours<Z: TimeZone>(tz: Tz, now: DateTime<Z>, start_hour: u32, end_hour: u32) -> bool {
    let local = now.with_timezone(&tz);
    in_window(local.hour(), start_hour, end_hour)
}

/// Like [`is_quiet_hours`] for an instant already expressed in local time.
pub fn is_quiet_hours_local(now: NaiveDateTime, start_hour: u32, end_hour: u32) -> bool {
    in_window(now.hour(), start_hour, end_hour)
}

fn in_window(hour: u32, start_hour: u32, end_hour: u32) -> bool {
    hour >= start_hour || hour < end_hour
}

/// Quiet window as configured, e.g. `start: "23:00"`, `end: "06:00"`.
///
/// Only the hour is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_window"))]
pub struct QuietHours {
    /// Start of the window, `HH:MM`
    #[validate(custom(function = "validate_clock_time"))]
    pub start: String,
    /// End of the window, `HH:MM`
    #[validate(custom(function = "validate_clock_time"))]
    pub end: String,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            start: format!("{:02}:00", QUIET_START),
            end: format!("{:02}:00", QUIET_END),
        }
    }
}

impl QuietHours {
    /// `(start_hour, end_hour)`, falling back to the defaults for unparsable values
    pub fn hours(&self) -> (u32, u32) {
        (
            parse_hour(&self.start).unwrap_or(QUIET_START),
            parse_hour(&self.end).unwrap_or(QUIET_END),
        )
    }
}

fn parse_hour(clock: &str) -> Option<u32> {
    let hour = clock.split(':').next()?.trim().parse::<u32>().ok()?;
    (hour < 24).then_some(hour)
}

fn validate_clock_time(clock: &str) -> Result<(), validator::ValidationError> {
    match parse_hour(clock) {
        Some(_) => Ok(()),
        None => Err(validator::ValidationError::new("invalid_clock_time")),
    }
}

fn validate_window(window: &QuietHours) -> Result<(), validator::ValidationError> {
    match (parse_hour(&window.start), parse_hour(&window.end)) {
        (Some(start), Some(end)) if start <= end => {
            Err(validator::ValidationError::new("quiet_window_must_wrap_midnight"))
        }
        _ => Ok(()),
    }
}
