//! Core types: ticket tags, log entries, durations, time windows

pub mod entry;
pub mod tag;
pub mod time;
pub mod tracing;

pub use entry::{DEFAULT_COMMENT_PREFIX, LogEntry, TaggedItem, WorklogBody, duration_minutes};
pub use tag::extract_ticket_ids;
pub use time::{
    InvalidLookback, LookbackDays, TimeWindow, format_tracker_timestamp, is_same_start,
    parse_tracker_timestamp,
};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
