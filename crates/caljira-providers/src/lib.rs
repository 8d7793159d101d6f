//! Calendar and worklog backends.
//!
//! This crate provides the two external services the sync talks to:
//!
//! - [`CalendarProvider`] - Source of calendar events ([`google::GoogleProvider`])
//! - [`WorklogTracker`] - Destination for time entries ([`jira::JiraClient`])
//! - [`RawEvent`] - Provider-agnostic raw event data
//! - [`ProviderError`] - Error type shared by both sides
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                 ┌─────────────────┐
//! │ Google Calendar │                 │    Jira REST    │
//! └────────┬────────┘                 └────────▲────────┘
//!          │                                   │
//!          ▼                                   │
//! ┌─────────────────┐                 ┌────────┴────────┐
//! │ GoogleProvider  │                 │   JiraClient    │
//! └────────┬────────┘                 └────────▲────────┘
//!          │ CalendarProvider                  │ WorklogTracker
//!          ▼                                   │
//!   ┌─────────────┐   tag extraction    ┌──────┴──────┐
//!   │  RawEvent   │ ──────────────────► │ WorklogBody │
//!   └─────────────┘                     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use caljira_providers::{CalendarProvider, FetchOptions};
//!
//! async fn fetch(provider: &dyn CalendarProvider, window: TimeWindow) -> ProviderResult<Vec<RawEvent>> {
//!     Ok(provider.fetch_events(FetchOptions::new(window)).await?.events)
//! }
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
#[cfg(feature = "jira")]
pub mod jira;
pub mod provider;
pub mod raw_event;
pub mod tracker;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{BoxFuture, CalendarProvider, ErrorProvider, FetchOptions, FetchResult};
pub use raw_event::{RawAttendee, RawEvent, RawEventTime};
pub use tracker::{RemoteWorklog, TrackerCredentials, WorklogAuthor, WorklogTracker};
