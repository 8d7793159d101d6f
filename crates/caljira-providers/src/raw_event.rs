//! Calendar events as the worklog pipeline sees them.
//!
//! A [`RawEvent`] carries the two places a ticket tag can live (the
//! description and the user's own attendee note) plus the start and end
//! that give the time spent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Start or end of an event.
///
/// Timed events resolve to an instant. All-day events only have a date and
/// therefore no duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl RawEventTime {
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::Date(date)
    }

    /// True for a bare date.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// The instant, or `None` for a bare date.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match *self {
            Self::DateTime(dt) => Some(dt),
            Self::Date(_) => None,
        }
    }
}

/// One entry of an event's guest list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAttendee {
    pub email: Option<String>,
    /// Set on the entry that belongs to the signed-in user.
    pub is_self: bool,
    /// Private note the attendee attached to their response.
    pub comment: Option<String>,
}

impl RawAttendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    /// Flags this entry as the signed-in user.
    pub fn as_self(mut self) -> Self {
        self.is_self = true;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A calendar event returned by a [`crate::CalendarProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Provider-side event id.
    pub id: String,
    pub start: RawEventTime,
    pub end: RawEventTime,
    pub summary: Option<String>,
    /// Free text, possibly HTML. Searched for ticket tags.
    pub description: Option<String>,
    /// Calendar the event was read from.
    pub calendar_id: String,
    /// `confirmed`, `tentative` or `cancelled`.
    pub status: Option<String>,
    pub attendees: Vec<RawAttendee>,
}

impl RawEvent {
    pub fn new(
        id: impl Into<String>,
        start: RawEventTime,
        end: RawEventTime,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            summary: None,
            description: None,
            calendar_id: calendar_id.into(),
            status: None,
            attendees: Vec::new(),
        }
    }

    /// The summary, or `""` for untitled events.
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or_default()
    }

    /// First attendee entry that belongs to the signed-in user.
    pub fn self_attendee(&self) -> Option<&RawAttendee> {
        self.attendees.iter().find(|a| a.is_self)
    }

    /// The signed-in user's note on this event.
    pub fn self_comment(&self) -> Option<&str> {
        self.self_attendee()?.comment.as_deref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }

    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_attendee(mut self, attendee: RawAttendee) -> Self {
        self.attendees.push(attendee);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
