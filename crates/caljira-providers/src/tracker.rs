//! WorklogTracker trait definition.
//!
//! A tracker stores time spent against tickets. The submitter reads the
//! existing worklogs of a ticket and creates a new one only when no
//! equivalent entry is present.

use std::fmt;

use base64::Engine;
use caljira_core::WorklogBody;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;
use crate::provider::BoxFuture;

/// Username and password for a tracker account.
///
/// The password is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct TrackerCredentials {
    /// Account name; also the author identity used for duplicate checks.
    pub username: String,
    password: String,
}

impl TrackerCredentials {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Builds an HTTP Basic `Authorization` header value (RFC 7617).
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        format!("Basic {}", encoded)
    }
}

impl fmt::Debug for TrackerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Author of a remote worklog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogAuthor {
    /// Login name.
    pub name: Option<String>,
    /// User key (older Jira servers).
    pub key: Option<String>,
    /// Human-readable name.
    pub display_name: Option<String>,
}

/// A worklog already stored on the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWorklog {
    /// Worklog id.
    #[serde(default)]
    pub id: Option<String>,
    /// Time spent in seconds.
    pub time_spent_seconds: i64,
    /// Start timestamp as the tracker formats it.
    pub started: String,
    /// Who logged the time.
    #[serde(default)]
    pub author: Option<WorklogAuthor>,
    /// Free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl RemoteWorklog {
    /// Returns true if `username` is the author, by login name or user key.
    pub fn is_authored_by(&self, username: &str) -> bool {
        self.author.as_ref().is_some_and(|a| {
            a.name.as_deref() == Some(username) || a.key.as_deref() == Some(username)
        })
    }
}

/// The core abstraction for worklog trackers.
pub trait WorklogTracker: Send + Sync {
    /// Returns the name of this tracker (e.g., "jira").
    fn name(&self) -> &str;

    /// Lists the worklogs recorded against a ticket.
    fn list_worklogs<'a>(
        &'a self,
        ticket_id: &'a str,
        credentials: &'a TrackerCredentials,
    ) -> BoxFuture<'a, ProviderResult<Vec<RemoteWorklog>>>;

    /// Creates a worklog on a ticket. The response body is not read.
    fn create_worklog<'a>(
        &'a self,
        ticket_id: &'a str,
        body: &'a WorklogBody,
        credentials: &'a TrackerCredentials,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
