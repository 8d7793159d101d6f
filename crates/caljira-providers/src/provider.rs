//! The calendar side of the sync.
//!
//! Providers fetch events for a time window and own their authentication
//! state. The worklog pipeline only ever talks to a `&dyn CalendarProvider`.

use std::future::Future;
use std::pin::Pin;

use caljira_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawEvent;

/// Result from fetching events.
#[derive(Debug, Default)]
pub struct FetchResult {
    /// The fetched events, ordered by start time.
    pub events: Vec<RawEvent>,
    /// Whether more events matched than `max_results` allowed.
    pub truncated: bool,
}

impl FetchResult {
    pub fn with_events(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            truncated: false,
        }
    }
}

/// What to fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Events overlapping this window.
    pub time_window: TimeWindow,
    /// Stop paginating once this many events are collected.
    pub max_results: Option<usize>,
    /// Return one event per occurrence of a recurring series.
    pub expand_recurring: bool,
}

impl FetchOptions {
    pub fn new(time_window: TimeWindow) -> Self {
        Self {
            time_window,
            max_results: None,
            expand_recurring: false,
        }
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    pub fn with_expand_recurring(mut self, expand: bool) -> Self {
        self.expand_recurring = expand;
        self
    }
}

/// Boxed future returned by the backend traits.
///
/// Keeps the provider traits object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A source of calendar events.
pub trait CalendarProvider: Send + Sync {
    /// Returns the name of this provider (e.g., "google:default").
    fn name(&self) -> &str;

    /// Fetches events in start-time order.
    ///
    /// Pagination is handled internally and stops at `max_results`.
    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>>;

    /// Checks if the provider holds usable credentials.
    fn is_authenticated(&self) -> bool;

    /// Runs the interactive authorization flow.
    fn authenticate(&self) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Provider that fails every call with a fixed error.
///
/// Stands in for a provider that failed to initialize.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn error(&self) -> ProviderError {
        ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name)
    }
}

impl CalendarProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_events(&self, _options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn is_authenticated(&self) -> bool {
        false
    }

    fn authenticate(&self) -> BoxFuture<'_, ProviderResult<()>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}
