//! Turning calendar events into tagged worklog candidates.

use caljira_core::{LookbackDays, TaggedItem, TimeWindow, extract_ticket_ids};
use caljira_providers::{CalendarProvider, FetchOptions, ProviderResult, RawEvent};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Upper bound on events fetched per run.
pub const MAX_EVENTS: usize = 500;

/// Returns `[now - days, now + 1 day]`.
pub fn lookback_window(days: LookbackDays, now: DateTime<Utc>) -> TimeWindow {
    TimeWindow::lookback(days, now)
}

/// Builds the tagged item for one event, if it carries a ticket reference.
///
/// The user's own attendee note wins over the description.
pub fn tagged_item(event: &RawEvent) -> Option<TaggedItem> {
    if event.is_cancelled() {
        return None;
    }

    let ticket_ids = [event.self_comment(), event.description.as_deref()]
        .into_iter()
        .flatten()
        .map(extract_ticket_ids)
        .find(|ids| !ids.is_empty())?;

    let (Some(start), Some(end)) = (event.start.as_datetime(), event.end.as_datetime()) else {
        warn!(
            "skipping all-day event {:?} tagged {}: no duration",
            event.summary_text(),
            ticket_ids.join(", ")
        );
        return None;
    };

    TaggedItem::new(&event.id, event.summary_text(), start, end, ticket_ids)
}

/// Keeps the events that carry a ticket reference, in input order.
pub fn extract_tagged(events: &[RawEvent]) -> Vec<TaggedItem> {
    events.iter().filter_map(tagged_item).collect()
}

/// Outcome of [`fetch_tagged`].
#[derive(Debug, Default)]
pub struct TaggedFetch {
    /// Number of events the calendar returned.
    pub total_events: usize,
    /// Events that carry a ticket reference.
    pub items: Vec<TaggedItem>,
}

/// Fetches the lookback window from `provider` and extracts tagged items.
///
/// The provider reads its configured calendar, `primary` unless overridden.
pub async fn fetch_tagged(
    provider: &dyn CalendarProvider,
    days: LookbackDays,
    now: DateTime<Utc>,
) -> ProviderResult<TaggedFetch> {
    let window = lookback_window(days, now);
    debug!(
        "fetching events from {} between {} and {}",
        provider.name(),
        window.start,
        window.end
    );

    let options = FetchOptions::new(window)
        .with_max_results(MAX_EVENTS)
        .with_expand_recurring(true);

    let result = provider.fetch_events(options).await?;
    let items = extract_tagged(&result.events);
    debug!(
        "{} of {} events are tagged",
        items.len(),
        result.events.len()
    );

    Ok(TaggedFetch {
        total_events: result.events.len(),
        items,
    })
}
