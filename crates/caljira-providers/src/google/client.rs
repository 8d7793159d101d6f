//! Google Calendar API client.
//!
//! Thin wrapper over the `events.list` endpoint: builds the query, follows
//! pagination and converts API events into [`RawEvent`]s.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawAttendee, RawEvent, RawEventTime};

/// Base URL for Google Calendar API v3.
pub(crate) const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Query for a single `events.list` call.
#[derive(Debug, Clone)]
pub struct EventQuery<'a> {
    /// Calendar to read, usually `primary`.
    pub calendar_id: &'a str,
    /// Lower bound for event end time.
    pub time_min: DateTime<Utc>,
    /// Upper bound for event start time.
    pub time_max: DateTime<Utc>,
    /// Cap on returned events, across pages.
    pub max_results: Option<usize>,
    /// Whether to expand recurring events into instances.
    pub single_events: bool,
}

/// Events returned by [`GoogleCalendarClient::list_events`].
#[derive(Debug, Default)]
pub struct EventList {
    /// Converted events in API order.
    pub events: Vec<RawEvent>,
    /// True when more pages existed past `max_results`.
    pub truncated: bool,
}

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    api_base: String,
}

impl GoogleCalendarClient {
    /// Creates a new Google Calendar client with the given access token.
    pub fn new(
        access_token: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            api_base: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Points the client at a different API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Updates the access token (after refresh).
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    /// Lists events from a calendar, following `nextPageToken`.
    pub async fn list_events(&self, query: &EventQuery<'_>) -> ProviderResult<EventList> {
        let mut list = EventList::default();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_events_page(query, page_token.as_deref()).await?;

            for event in page.items {
                if let Some(raw_event) = convert_event(event, query.calendar_id) {
                    list.events.push(raw_event);
                }
            }

            let Some(token) = page.next_page_token else {
                break;
            };

            if let Some(max) = query.max_results
                && list.events.len() >= max
            {
                list.truncated = true;
                break;
            }
            page_token = Some(token);
        }

        if let Some(max) = query.max_results
            && list.events.len() > max
        {
            list.events.truncate(max);
            list.truncated = true;
        }

        debug!(
            "fetched {} events from calendar {}",
            list.events.len(),
            query.calendar_id
        );
        Ok(list)
    }

    /// Fetches a single page of events.
    async fn list_events_page(
        &self,
        query: &EventQuery<'_>,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListResponse> {
        let url = format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(query.calendar_id)
        );

        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", query.time_min.to_rfc3339()),
                ("timeMax", query.time_max.to_rfc3339()),
                ("singleEvents", query.single_events.to_string()),
                ("orderBy", "startTime".to_string()),
            ]);

        if let Some(max) = query.max_results {
            request = request.query(&[("maxResults", max.to_string())]);
        }

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token.to_string())]);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ProviderError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication(
                "access token expired or invalid",
            ));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::authorization("access denied to calendar"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })
    }
}

/// Converts a Google Calendar API event to a RawEvent.
fn convert_event(event: ApiEvent, calendar_id: &str) -> Option<RawEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let id = event.id?;
    let start = parse_event_time(event.start, &id, "start")?;
    let end = parse_event_time(event.end, &id, "end")?;

    let attendees = event
        .attendees
        .unwrap_or_default()
        .into_iter()
        .map(|a| RawAttendee {
            email: a.email,
            is_self: a.is_self.unwrap_or(false),
            comment: a.comment,
        })
        .collect();

    let mut raw_event = RawEvent::new(id, start, end, calendar_id);
    raw_event.summary = event.summary;
    raw_event.description = event.description;
    raw_event.status = event.status;
    raw_event.attendees = attendees;

    Some(raw_event)
}

fn parse_event_time(time: ApiEventTime, id: &str, which: &str) -> Option<RawEventTime> {
    match (time.date_time, time.date) {
        (Some(dt), _) => DateTime::parse_from_rfc3339(&dt)
            .map(|parsed| RawEventTime::DateTime(parsed.with_timezone(&Utc)))
            .map_err(|e| warn!("event {}: failed to parse {} time: {}", id, which, e))
            .ok(),
        (None, Some(date)) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map(RawEventTime::Date)
            .map_err(|e| warn!("event {}: failed to parse {} date: {}", id, which, e))
            .ok(),
        (None, None) => {
            warn!("event {} has no {} time", id, which);
            None
        }
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    start: ApiEventTime,
    end: ApiEventTime,
    status: Option<String>,
    attendees: Option<Vec<ApiAttendee>>,
}

/// Event time from the API.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

/// Attendee from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAttendee {
    email: Option<String>,
    #[serde(rename = "self")]
    is_self: Option<bool>,
    comment: Option<String>,
}
