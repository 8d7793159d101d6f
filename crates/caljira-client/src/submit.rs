//! Submitting accepted entries to the tracker.
//!
//! Each entry is checked against the ticket's existing worklogs first, so
//! running the tool twice over the same window logs nothing new.

use std::io::{self, Write};

use caljira_core::{LogEntry, WorklogBody};
use caljira_providers::{ProviderResult, RemoteWorklog, TrackerCredentials, WorklogTracker};
use tracing::{debug, error};

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new worklog was created.
    Created,
    /// An equivalent worklog by the same author already existed.
    AlreadyLogged,
}

/// Counters for a [`submit_all`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitStats {
    pub created: usize,
    pub already_logged: usize,
    pub failed: usize,
}

impl SubmitStats {
    /// Returns true if no entry failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Returns true if `worklogs` already holds `entry` logged by `username`.
pub fn is_duplicate(entry: &LogEntry, worklogs: &[RemoteWorklog], username: &str) -> bool {
    worklogs.iter().any(|w| {
        w.is_authored_by(username) && entry.matches_remote(w.time_spent_seconds, &w.started)
    })
}

/// Logs one entry unless an equivalent worklog exists.
pub async fn submit_entry(
    tracker: &dyn WorklogTracker,
    entry: &LogEntry,
    credentials: &TrackerCredentials,
    comment_prefix: &str,
) -> ProviderResult<SubmitOutcome> {
    let worklogs = tracker.list_worklogs(&entry.ticket_id, credentials).await?;
    if is_duplicate(entry, &worklogs, &credentials.username) {
        debug!(
            "{} already has a worklog at {}",
            entry.ticket_id,
            entry.started_string()
        );
        return Ok(SubmitOutcome::AlreadyLogged);
    }

    let body = WorklogBody::from_entry(entry, comment_prefix);
    tracker
        .create_worklog(&entry.ticket_id, &body, credentials)
        .await?;
    Ok(SubmitOutcome::Created)
}

/// Submits every entry in order and prints one line per entry, then `Done`.
///
/// Failures are reported and do not stop the remaining entries.
pub async fn submit_all(
    tracker: &dyn WorklogTracker,
    entries: &[LogEntry],
    credentials: &TrackerCredentials,
    comment_prefix: &str,
    out: &mut dyn Write,
) -> io::Result<SubmitStats> {
    let mut stats = SubmitStats::default();

    for entry in entries {
        match submit_entry(tracker, entry, credentials, comment_prefix).await {
            Ok(SubmitOutcome::Created) => {
                stats.created += 1;
                writeln!(
                    out,
                    "Logged {} minutes against {} for \"{}\"",
                    entry.minutes, entry.ticket_id, entry.summary
                )?;
            }
            Ok(SubmitOutcome::AlreadyLogged) => {
                stats.already_logged += 1;
                writeln!(
                    out,
                    "Already logged {} minutes against {} for \"{}\"",
                    entry.minutes, entry.ticket_id, entry.summary
                )?;
            }
            Err(e) => {
                stats.failed += 1;
                error!(
                    "failed to log {} against {}: {}",
                    entry.summary, entry.ticket_id, e
                );
                writeln!(
                    out,
                    "Failed to log \"{}\" against {}: {}",
                    entry.summary, entry.ticket_id, e
                )?;
            }
        }
    }

    writeln!(out, "Done")?;
    Ok(stats)
}
