//! Settings for reading events from Google Calendar.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// OAuth 2.0 client credentials for Google API access.
///
/// Google requires a registered application, so users bring their own
/// client ID and secret.
#[derive(Clone)]
pub struct OAuthCredentials {
    /// Ends in `.apps.googleusercontent.com`.
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Layout of a downloaded credentials JSON file.
///
/// Either the Cloud Console shape with an `installed` or `web` section, or
/// a flat object with `client_id` and `client_secret` at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Reads a downloaded `credentials.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            format!("failed to read credentials file {}: {}", path.display(), e)
        })?;
        Self::from_json(&content)
    }

    /// Parses OAuth credentials from a credentials JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse credentials JSON: {}", e))?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        match (file.client_id, file.client_secret) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            _ => Err("credentials file must contain an 'installed'/'web' section \
                 or 'client_id'/'client_secret' at root level"
                .to_string()),
        }
    }

    /// Checks that the credentials look like a Google desktop client.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Everything [`super::GoogleProvider`] needs to run.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Account name, used in the provider name and the token file name.
    pub account_name: String,

    pub credentials: OAuthCredentials,

    /// Where OAuth tokens are stored.
    ///
    /// Defaults to `~/.local/share/caljira/google-tokens-{account}.json`.
    pub token_path: PathBuf,

    /// Calendar read when a fetch does not name one.
    pub calendar_id: String,

    /// Root of the Calendar API.
    pub api_base: String,

    /// Request timeout.
    pub timeout: Duration,

    pub user_agent: String,

    /// Ports tried, in order, for the OAuth loopback listener.
    pub loopback_port_range: (u16, u16),

    pub scopes: Vec<String>,
}

impl GoogleConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Read-only access is all the sync needs.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";

    /// Calendar read by default.
    pub const PRIMARY_CALENDAR: &'static str = "primary";

    /// Defaults: account `default`, calendar `primary`, 30 s timeout.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            account_name: "default".to_string(),
            credentials,
            token_path: Self::default_token_path("default"),
            calendar_id: Self::PRIMARY_CALENDAR.to_string(),
            api_base: super::client::CALENDAR_API_BASE.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("caljira/{}", env!("CARGO_PKG_VERSION")),
            loopback_port_range: (8080, 8090),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
        }
    }

    /// Returns the default token path for an account.
    pub fn default_token_path(account_name: &str) -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".local").join("share"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("caljira")
            .join(format!("google-tokens-{}.json", account_name))
    }

    ///
    /// A token path still at its default follows the new name.
    pub fn with_account_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if self.token_path == Self::default_token_path(&self.account_name) {
            self.token_path = Self::default_token_path(&name);
        }
        self.account_name = name;
        self
    }

    /// Returns the provider name for this account (e.g. `"google:work"`).
    pub fn provider_name(&self) -> String {
        format!("google:{}", self.account_name)
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the calendar to read.
    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    /// Sets the Calendar API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Rejects settings that would only fail later, at request time.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }

        if self.calendar_id.trim().is_empty() {
            return Err("calendar id must not be empty".to_string());
        }

        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err("invalid loopback port range".to_string());
        }

        Ok(())
    }
}
