//! Jira tracker configuration.

use std::time::Duration;

use url::Url;

/// Configuration for the Jira worklog tracker.
#[derive(Debug, Clone)]
pub struct JiraConfig {
    /// Base URL of the Jira server, always ending in `/`.
    pub base_url: Url,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl JiraConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a new Jira configuration for the given server URL.
    ///
    /// A context path such as `https://host/jira` is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let raw = base_url.as_ref().trim();
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };

        Ok(Self {
            base_url: Url::parse(&normalized)?,
            verify_tls: true,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("caljira/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Sets whether TLS certificates are verified.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the worklog collection URL for a ticket.
    pub fn worklog_url(&self, ticket_id: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(&format!(
            "rest/api/latest/issue/{}/worklog",
            urlencoding::encode(ticket_id)
        ))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self.base_url.scheme() {
            "http" | "https" => {}
            other => return Err(format!("unsupported URL scheme: {}", other)),
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
