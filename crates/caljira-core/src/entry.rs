//! Tagged calendar items and the worklog entries built from them.
//!
//! The pipeline turns calendar events into [`TaggedItem`]s, the tagged items
//! into [`LogEntry`] candidates, and each candidate into a [`WorklogBody`]
//! ready to send to the tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{format_tracker_timestamp, is_same_start};

/// Comment prefix used for worklogs created from calendar events.
pub const DEFAULT_COMMENT_PREFIX: &str = "Automated log from calendar: ";

/// A calendar event that carries at least one ticket reference.
///
/// Only built through [`TaggedItem::new`], which rejects an empty id list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedItem {
    /// Identifier of the source event.
    pub event_id: String,
    /// The event summary/title.
    pub summary: String,
    /// When the event starts.
    pub start: DateTime<Utc>,
    /// When the event ends.
    pub end: DateTime<Utc>,
    ticket_ids: Vec<String>,
}

impl TaggedItem {
    /// Creates a tagged item, returning `None` when no ticket ids are given.
    pub fn new(
        event_id: impl Into<String>,
        summary: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        ticket_ids: Vec<String>,
    ) -> Option<Self> {
        if ticket_ids.is_empty() {
            return None;
        }
        Some(Self {
            event_id: event_id.into(),
            summary: summary.into(),
            start,
            end,
            ticket_ids,
        })
    }

    /// All ticket ids found, without the leading `#`, in order. Never empty.
    pub fn ticket_ids(&self) -> &[String] {
        &self.ticket_ids
    }

    /// The ticket the time is logged against.
    pub fn primary_ticket(&self) -> &str {
        self.ticket_ids.first().map(String::as_str).unwrap_or_default()
    }

    /// Elapsed minutes between start and end.
    pub fn minutes(&self) -> f64 {
        duration_minutes(self.start, self.end)
    }

    /// Builds the log entry for this item.
    pub fn to_log_entry(&self) -> LogEntry {
        LogEntry {
            ticket_id: self.primary_ticket().to_string(),
            summary: self.summary.clone(),
            minutes: self.minutes(),
            started: self.start,
        }
    }
}

/// A worklog candidate waiting to be submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The tracker ticket, e.g. `PROJ-123`.
    pub ticket_id: String,
    /// The event summary, used for the worklog comment.
    pub summary: String,
    /// Time spent, in (possibly fractional) minutes.
    pub minutes: f64,
    /// When the work started.
    pub started: DateTime<Utc>,
}

impl LogEntry {
    /// Time spent in whole seconds, truncated.
    ///
    /// `minutes` comes from a millisecond count, so it is rounded back to
    /// milliseconds first; `2.05` minutes would otherwise floor to 122 s.
    pub fn time_spent_seconds(&self) -> i64 {
        let millis = (self.minutes * 60_000.0).round() as i64;
        millis / 1000
    }

    /// The `started` value as the tracker formats it.
    pub fn started_string(&self) -> String {
        format_tracker_timestamp(self.started)
    }

    /// Returns true if a remote worklog with these values describes this entry.
    pub fn matches_remote(&self, time_spent_seconds: i64, started: &str) -> bool {
        time_spent_seconds == self.time_spent_seconds() && is_same_start(started, self.started)
    }
}

/// Request body for creating a worklog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogBody {
    /// Time spent in seconds.
    pub time_spent_seconds: i64,
    /// Start timestamp, see [`crate::time::TRACKER_TIMESTAMP_FORMAT`].
    pub started: String,
    /// Free-text comment.
    pub comment: String,
}

impl WorklogBody {
    /// Builds the body for `entry`, prefixing the comment with `prefix`.
    pub fn from_entry(entry: &LogEntry, prefix: &str) -> Self {
        Self {
            time_spent_seconds: entry.time_spent_seconds(),
            started: entry.started_string(),
            comment: format!("{}{}", prefix, entry.summary),
        }
    }
}

/// Minutes between two instants, as `(end - start)` in ms divided by 60000.
///
/// Not rounded; negative if `end` precedes `start`.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
    }

    fn item(ids: &[&str], start: DateTime<Utc>, end: DateTime<Utc>) -> TaggedItem {
        TaggedItem::new(
            "evt-1",
            "Sprint planning",
            start,
            end,
            ids.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn half_hour_is_thirty_minutes() {
        assert_eq!(duration_minutes(utc(10, 0, 0), utc(10, 30, 0)), 30.0);
    }

    #[test]
    fn fractional_minutes_are_kept() {
        assert_eq!(duration_minutes(utc(10, 0, 0), utc(10, 0, 30)), 0.5);
        assert_eq!(duration_minutes(utc(10, 0, 0), utc(10, 22, 45)), 22.75);
    }

    #[test]
    fn zero_length_event() {
        assert_eq!(duration_minutes(utc(10, 0, 0), utc(10, 0, 0)), 0.0);
    }

    #[test]
    fn tagged_item_requires_ids() {
        assert!(TaggedItem::new("e", "s", utc(9, 0, 0), utc(10, 0, 0), vec![]).is_none());
    }

    #[test]
    fn only_first_ticket_is_used() {
        let item = item(&["SLPDEV-42", "OPS-7"], utc(9, 0, 0), utc(9, 45, 0));
        let entry = item.to_log_entry();
        assert_eq!(entry.ticket_id, "SLPDEV-42");
        assert_eq!(entry.minutes, 45.0);
        assert_eq!(entry.summary, "Sprint planning");
        assert_eq!(entry.started, utc(9, 0, 0));
    }

    #[test]
    fn seconds_are_truncated() {
        let entry = LogEntry {
            ticket_id: "A-1".to_string(),
            summary: String::new(),
            minutes: 0.9999,
            started: utc(9, 0, 0),
        };
        assert_eq!(entry.time_spent_seconds(), 59);
    }

    #[test]
    fn odd_second_durations_survive_minutes() {
        let item = item(&["A-1"], utc(10, 0, 0), utc(10, 2, 3));
        let body = WorklogBody::from_entry(&item.to_log_entry(), DEFAULT_COMMENT_PREFIX);
        assert_eq!(body.time_spent_seconds, 123);

        for secs in [245, 246, 3_599, 86_399] {
            let end = utc(0, 0, 0) + chrono::Duration::seconds(secs);
            let entry = item_at(end).to_log_entry();
            assert_eq!(entry.time_spent_seconds(), secs, "{} s", secs);
        }
    }

    fn item_at(end: DateTime<Utc>) -> TaggedItem {
        item(&["A-1"], utc(0, 0, 0), end)
    }

    #[test]
    fn ticket_ids_keep_order() {
        let item = item(&["SLPDEV-42", "OPS-7"], utc(9, 0, 0), utc(9, 45, 0));
        assert_eq!(item.ticket_ids(), ["SLPDEV-42", "OPS-7"]);
        assert_eq!(item.primary_ticket(), "SLPDEV-42");
    }

    #[test]
    fn body_from_entry() {
        let entry = item(&["A-1"], utc(10, 0, 0), utc(10, 30, 0)).to_log_entry();
        let body = WorklogBody::from_entry(&entry, DEFAULT_COMMENT_PREFIX);

        assert_eq!(body.time_spent_seconds, 1800);
        assert_eq!(body.started, "2024-01-01T10:00:00.000+0000");
        assert_eq!(
            body.comment,
            "Automated log from calendar: Sprint planning"
        );
    }

    #[test]
    fn body_serializes_camel_case() {
        let entry = item(&["A-1"], utc(10, 0, 0), utc(10, 30, 0)).to_log_entry();
        let body = WorklogBody::from_entry(&entry, "x: ");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["timeSpentSeconds"], 1800);
        assert_eq!(json["started"], "2024-01-01T10:00:00.000+0000");
        assert_eq!(json["comment"], "x: Sprint planning");
    }

    #[test]
    fn matches_remote_on_duration_and_start() {
        let entry = item(&["A-1"], utc(10, 0, 0), utc(10, 30, 0)).to_log_entry();

        assert!(entry.matches_remote(1800, "2024-01-01T10:00:00.000+0000"));
        assert!(entry.matches_remote(1800, "2024-01-01T10:00:00+0000"));
        assert!(!entry.matches_remote(1799, "2024-01-01T10:00:00.000+0000"));
        assert!(!entry.matches_remote(1800, "2024-01-02T10:00:00.000+0000"));
    }
}
