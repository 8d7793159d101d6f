//! The sync command: calendar events in, worklogs out.

use std::io::{self, Write};

use caljira_core::{LogEntry, LookbackDays};
use caljira_providers::{CalendarProvider, WorklogTracker};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::extract::fetch_tagged;
use crate::prompt::{Prompter, TerminalPrompter};
use crate::review::{ask_lookback, ask_review, collect_credentials, review_items};
use crate::submit::{SubmitStats, submit_all};

pub const NO_EVENTS: &str = "No events";
pub const NO_TAGGED_ENTRIES: &str = "No tagged entries found - have you marked up calendar entries with #PROJ-123 in either the description or your attendee note?";

/// Answers given on the command line instead of at the prompt.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Lookback; asked for when `None`.
    pub days: Option<LookbackDays>,
    /// Whether to confirm each entry; asked for when `None`.
    pub review: Option<bool>,
    /// Stop after review and print what would be logged.
    pub dry_run: bool,
}

/// Tracker-side settings resolved from the config file.
#[derive(Debug, Clone, Default)]
pub struct TrackerSettings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub comment_prefix: String,
}

/// How a sync run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// The calendar returned nothing in the window.
    NoEvents,
    /// Events exist but none carry a ticket reference.
    NoTaggedEntries { events: usize },
    /// Dry run; nothing was sent.
    DryRun { accepted: usize },
    /// Entries were submitted.
    Submitted(SubmitStats),
}

/// Runs the sync pipeline against the configured calendar and Jira server.
#[cfg(feature = "google")]
pub async fn run(config: &ClientConfig, options: SyncOptions) -> ClientResult<SyncReport> {
    use caljira_providers::google::GoogleProvider;
    use caljira_providers::jira::JiraClient;

    let jira = config.jira().map_err(ClientError::Config)?;
    let tracker = JiraClient::new(jira.to_tracker_config().map_err(ClientError::Config)?)?;
    let (username, password) = jira.resolve_credentials().map_err(ClientError::Config)?;
    let settings = TrackerSettings {
        username,
        password,
        comment_prefix: jira.comment_prefix().to_string(),
    };

    let google = config.google.clone().unwrap_or_default();
    let provider = GoogleProvider::new(google.to_provider_config().map_err(ClientError::Config)?)?;

    sync_with(
        &provider,
        &tracker,
        &settings,
        &options,
        &mut TerminalPrompter::new(),
        &mut io::stdout(),
        Utc::now(),
    )
    .await
}

#[cfg(not(feature = "google"))]
pub async fn run(_config: &ClientConfig, _options: SyncOptions) -> ClientResult<SyncReport> {
    Err(ClientError::Unsupported("Google Calendar"))
}

/// Runs the sync pipeline with the given backends.
///
/// Authenticates first if needed, then asks for the lookback and review
/// mode, fetches and reviews tagged events, asks for tracker credentials and
/// submits. Errors from the calendar end the run. Errors from the tracker are
/// reported per entry.
pub async fn sync_with(
    provider: &dyn CalendarProvider,
    tracker: &dyn WorklogTracker,
    settings: &TrackerSettings,
    options: &SyncOptions,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
    now: DateTime<Utc>,
) -> ClientResult<SyncReport> {
    if !provider.is_authenticated() {
        writeln!(
            out,
            "We need to authenticate with {}. A browser window will open.",
            provider.name()
        )?;
        provider.authenticate().await?;
        info!("authenticated with {}", provider.name());
    }

    let days = match options.days {
        Some(days) => days,
        None => ask_lookback(prompter)?,
    };
    let review = match options.review {
        Some(review) => review,
        None => ask_review(prompter)?,
    };

    let fetched = fetch_tagged(provider, days, now).await?;
    if fetched.total_events == 0 {
        writeln!(out, "{}", NO_EVENTS)?;
        return Ok(SyncReport::NoEvents);
    }
    if fetched.items.is_empty() {
        writeln!(out, "{}", NO_TAGGED_ENTRIES)?;
        return Ok(SyncReport::NoTaggedEntries {
            events: fetched.total_events,
        });
    }

    let entries = review_items(&fetched.items, review, prompter)?;

    if options.dry_run {
        print_dry_run(&entries, out)?;
        return Ok(SyncReport::DryRun {
            accepted: entries.len(),
        });
    }

    let credentials = collect_credentials(
        prompter,
        settings.username.clone(),
        settings.password.clone(),
    )?;

    let stats = submit_all(
        tracker,
        &entries,
        &credentials,
        &settings.comment_prefix,
        out,
    )
    .await?;
    info!(
        "sync finished: {} created, {} already logged, {} failed",
        stats.created, stats.already_logged, stats.failed
    );
    Ok(SyncReport::Submitted(stats))
}

fn print_dry_run(entries: &[LogEntry], out: &mut dyn Write) -> io::Result<()> {
    for entry in entries {
        writeln!(
            out,
            "Would log {} minutes against {} at {} for \"{}\"",
            entry.minutes,
            entry.ticket_id,
            entry.started_string(),
            entry.summary
        )?;
    }
    writeln!(out, "Dry run: {} entries, nothing submitted", entries.len())
}
