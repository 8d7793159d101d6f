//! Time types for the worklog pipeline.
//!
//! This module provides [`TimeWindow`] for calendar query ranges,
//! [`LookbackDays`] for the user-chosen history length, and the timestamp
//! format the tracker expects for worklog `started` values.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Format used for worklog `started` values: millisecond precision, UTC,
/// with an explicit `+0000` offset instead of `Z`.
pub const TRACKER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f+0000";

/// A time window for querying calendar events.
///
/// Represents a closed-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates the window `[now - days, now + 1 day]` used to look back over
    /// recent calendar history.
    pub fn lookback(days: LookbackDays, now: DateTime<Utc>) -> Self {
        Self::new(
            now - Duration::days(i64::from(days.get())),
            now + Duration::days(1),
        )
    }
}

/// Number of days to look back when fetching calendar events.
///
/// Always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct LookbackDays(u32);

impl LookbackDays {
    /// Smallest accepted value.
    pub const MIN: u32 = 1;
    /// Largest accepted value.
    pub const MAX: u32 = 40;
    /// Value used when the input is missing or invalid.
    pub const DEFAULT: Self = Self(7);

    /// Creates a lookback, rejecting values outside `MIN..=MAX`.
    pub fn new(days: u32) -> Result<Self, InvalidLookback> {
        if (Self::MIN..=Self::MAX).contains(&days) {
            Ok(Self(days))
        } else {
            Err(InvalidLookback(days.to_string()))
        }
    }

    /// Parses user input such as `"14"` or `" 3\n"`.
    pub fn parse(input: &str) -> Result<Self, InvalidLookback> {
        let trimmed = input.trim();
        let days: u32 = trimmed
            .parse()
            .map_err(|_| InvalidLookback(trimmed.to_string()))?;
        Self::new(days)
    }

    /// Returns the number of days.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for LookbackDays {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for LookbackDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for LookbackDays {
    type Error = InvalidLookback;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<LookbackDays> for u32 {
    fn from(days: LookbackDays) -> Self {
        days.0
    }
}

/// Error returned for a lookback outside the accepted range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid number of days {0:?} (expected {min}..={max})",
    min = LookbackDays::MIN,
    max = LookbackDays::MAX
)]
pub struct InvalidLookback(String);

/// Formats a start time the way the tracker stores worklog `started` values.
pub fn format_tracker_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(TRACKER_TIMESTAMP_FORMAT).to_string()
}

/// Parses a tracker `started` value such as `2024-01-01T10:00:00.000+0000`.
///
/// Fractional seconds are optional and `Z`/`+00:00` style offsets are
/// accepted too.
pub fn parse_tracker_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Returns true if a tracker `started` value denotes the given instant.
///
/// Values that cannot be parsed fall back to exact string comparison
/// against [`format_tracker_timestamp`].
pub fn is_same_start(remote: &str, local: DateTime<Utc>) -> bool {
    match parse_tracker_timestamp(remote) {
        Some(parsed) => parsed.timestamp_millis() == local.timestamp_millis(),
        None => remote == format_tracker_timestamp(local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    mod time_window {
        use super::*;

        #[test]
        fn creation() {
            let start = utc(2025, 2, 5, 9, 0, 0);
            let end = utc(2025, 2, 5, 17, 0, 0);
            let window = TimeWindow::new(start, end);
            assert_eq!(window.start, start);
            assert_eq!(window.end, end);
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn invalid_window() {
            TimeWindow::new(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 9, 0, 0));
        }

        #[test]
        fn lookback_spans_history_and_one_day_ahead() {
            let now = utc(2024, 3, 10, 12, 0, 0);
            let window = TimeWindow::lookback(LookbackDays::new(7).unwrap(), now);
            assert_eq!(window.start, utc(2024, 3, 3, 12, 0, 0));
            assert_eq!(window.end, utc(2024, 3, 11, 12, 0, 0));
        }
    }

    mod lookback {
        use super::*;

        #[test]
        fn accepts_range_bounds() {
            assert_eq!(LookbackDays::parse("1").unwrap().get(), 1);
            assert_eq!(LookbackDays::parse("40").unwrap().get(), 40);
            assert_eq!(LookbackDays::parse(" 14\n").unwrap().get(), 14);
        }

        #[test]
        fn rejects_invalid_input() {
            for input in ["abc", "0", "41", "", "-3", "2.5"] {
                assert!(LookbackDays::parse(input).is_err(), "input {:?}", input);
            }
            assert_eq!(LookbackDays::DEFAULT.get(), 7);
        }

        #[test]
        fn error_mentions_input() {
            let err = LookbackDays::parse("41").unwrap_err();
            assert!(err.to_string().contains("41"));
            assert!(err.to_string().contains("1..=40"));
        }

        #[test]
        fn serde_rejects_out_of_range() {
            let days: LookbackDays = serde_json::from_str("10").unwrap();
            assert_eq!(days.get(), 10);
            assert!(serde_json::from_str::<LookbackDays>("0").is_err());
        }
    }

    mod tracker_timestamp {
        use super::*;

        #[test]
        fn format_uses_fixed_offset() {
            let dt = utc(2024, 1, 1, 10, 0, 0);
            assert_eq!(format_tracker_timestamp(dt), "2024-01-01T10:00:00.000+0000");
        }

        #[test]
        fn parse_round_trips_format() {
            let dt = utc(2024, 1, 1, 10, 0, 0);
            let parsed = parse_tracker_timestamp(&format_tracker_timestamp(dt));
            assert_eq!(parsed, Some(dt));
        }

        #[test]
        fn parse_accepts_other_offsets() {
            assert_eq!(
                parse_tracker_timestamp("2024-01-01T11:00:00.000+0100"),
                Some(utc(2024, 1, 1, 10, 0, 0))
            );
            assert_eq!(
                parse_tracker_timestamp("2024-01-01T10:00:00Z"),
                Some(utc(2024, 1, 1, 10, 0, 0))
            );
        }

        #[test]
        fn same_start_ignores_reformatting() {
            let dt = utc(2024, 1, 1, 10, 0, 0);
            assert!(is_same_start("2024-01-01T10:00:00.000+0000", dt));
            assert!(is_same_start("2024-01-01T10:00:00+0000", dt));
            assert!(is_same_start("2024-01-01T12:00:00.000+0200", dt));
            assert!(!is_same_start("2024-01-01T10:01:00.000+0000", dt));
        }

        #[test]
        fn same_start_falls_back_to_string_compare() {
            let dt = utc(2024, 1, 1, 10, 0, 0);
            assert!(!is_same_start("yesterday", dt));
        }
    }
}
