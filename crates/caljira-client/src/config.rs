//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/caljira/config.toml` by default:
//!
//! ```toml
//! [google]
//! client_id = "xxx.apps.googleusercontent.com"
//! client_secret = "pass::google/caljira"
//!
//! [jira]
//! base_url = "https://jira.example.com"
//! username = "alice"
//! password = "env::JIRA_PASSWORD"
//! ```
//!
//! Credential values support secret references:
//! - `pass::path/in/store`, resolved via `pass show`
//! - `env::VAR_NAME`, resolved from the environment
//! - plain text, used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use caljira_core::DEFAULT_COMMENT_PREFIX;
use caljira_providers::jira::JiraConfig;
use serde::{Deserialize, Serialize};

use crate::secret;

/// Configuration for the caljira client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google Calendar settings.
    #[cfg(feature = "google")]
    pub google: Option<GoogleSettings>,

    /// Jira settings.
    pub jira: Option<JiraSettings>,

    /// Debug mode.
    pub debug: bool,
}

impl ClientConfig {
    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("caljira")
    }

    /// Returns the `[jira]` section or an error telling how to add one.
    pub fn jira(&self) -> Result<&JiraSettings, String> {
        self.jira.as_ref().ok_or_else(|| {
            format!(
                "Jira is not configured. Add to {}:\n  \
                 [jira]\n  \
                 base_url = \"https://jira.example.com\"",
                Self::default_path().display()
            )
        })
    }
}

// ---------------------------------------------------------------------------
// GoogleSettings
// ---------------------------------------------------------------------------

/// Google Calendar settings.
///
/// Credentials come either inline (`client_id`, `client_secret`) or from a
/// downloaded Cloud Console JSON file (`credentials_file`).
#[cfg(feature = "google")]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Path to a Cloud Console credentials JSON file.
    pub credentials_file: Option<PathBuf>,

    /// Account name, used to name the token file.
    pub account: Option<String>,

    /// Calendar to read. Defaults to `primary`.
    pub calendar_id: Option<String>,

    /// Path to token storage.
    pub token_path: Option<PathBuf>,
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Builds the provider configuration, resolving secret references.
    pub fn to_provider_config(&self) -> Result<caljira_providers::google::GoogleConfig, String> {
        use caljira_providers::google::GoogleConfig;

        let credentials = self.resolve_credentials()?;
        credentials.validate().map_err(|e| e.to_string())?;

        let mut config = GoogleConfig::new(credentials);

        if let Some(ref account) = self.account {
            config = config.with_account_name(account);
        }

        if let Some(ref calendar_id) = self.calendar_id {
            config = config.with_calendar_id(calendar_id);
        }

        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }

        Ok(config)
    }

    /// Resolves Google OAuth credentials.
    ///
    /// Inline values win over `credentials_file`. Inline values go through
    /// [`secret::resolve`].
    pub(crate) fn resolve_credentials(
        &self,
    ) -> Result<caljira_providers::google::OAuthCredentials, String> {
        use caljira_providers::google::OAuthCredentials;

        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(raw_id), Some(raw_secret)) => {
                let id = secret::resolve(raw_id)
                    .map_err(|e| format!("failed to resolve client_id: {}", e))?;
                let secret = secret::resolve(raw_secret)
                    .map_err(|e| format!("failed to resolve client_secret: {}", e))?;
                Ok(OAuthCredentials::new(id, secret))
            }
            (Some(_), None) => {
                Err("client_secret is missing from [google] section in config.toml".to_string())
            }
            (None, Some(_)) => {
                Err("client_id is missing from [google] section in config.toml".to_string())
            }
            (None, None) => match self.credentials_file {
                Some(ref path) => OAuthCredentials::from_file(path),
                None => Err(format!(
                    "Google credentials not found. Add to {}:\n  \
                     [google]\n  \
                     client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                     client_secret = \"YOUR_SECRET\"\n\n  \
                     Or run: caljira auth google --credentials-file <path>",
                    ClientConfig::default_path().display()
                )),
            },
        }
    }

    /// Returns true if any credential source is set.
    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() || self.client_secret.is_some() || self.credentials_file.is_some()
    }
}

// ---------------------------------------------------------------------------
// JiraSettings
// ---------------------------------------------------------------------------

/// Jira settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraSettings {
    /// Server root, e.g. `https://jira.example.com` or `https://host/jira`.
    pub base_url: Option<String>,

    /// Whether to verify the server's TLS certificate.
    pub verify_tls: bool,

    /// Prefix put in front of the event summary in worklog comments.
    pub comment_prefix: Option<String>,

    /// Account name (supports secret references). Prompted when unset.
    pub username: Option<String>,

    /// Account password (supports secret references). Prompted when unset.
    pub password: Option<String>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,
}

impl Default for JiraSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            verify_tls: true,
            comment_prefix: None,
            username: None,
            password: None,
            timeout: None,
        }
    }
}

impl JiraSettings {
    /// Builds the tracker configuration.
    pub fn to_tracker_config(&self) -> Result<JiraConfig, String> {
        let raw = self
            .base_url
            .as_deref()
            .ok_or_else(|| "base_url is missing from [jira] section in config.toml".to_string())?;
        let base_url = secret::resolve(raw)?;

        let mut config = JiraConfig::new(&base_url)
            .map_err(|e| format!("invalid Jira base_url {:?}: {}", base_url, e))?
            .with_verify_tls(self.verify_tls);

        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Returns the worklog comment prefix.
    pub fn comment_prefix(&self) -> &str {
        self.comment_prefix
            .as_deref()
            .unwrap_or(DEFAULT_COMMENT_PREFIX)
    }

    /// Resolves the configured username and password, if any.
    pub fn resolve_credentials(&self) -> Result<(Option<String>, Option<String>), String> {
        let username = secret::resolve_opt(self.username.as_deref())
            .map_err(|e| format!("failed to resolve Jira username: {}", e))?;
        let password = secret::resolve_opt(self.password.as_deref())
            .map_err(|e| format!("failed to resolve Jira password: {}", e))?;
        Ok((username, password))
    }
}
