//! Google Calendar provider.
//!
//! [`GoogleProvider`] reads events from Google Calendar API v3.
//!
//! # Authentication Flow
//!
//! 1. User provides their own OAuth client ID/secret (required by Google)
//! 2. Provider binds a loopback listener on the first free port in range
//! 3. Opens the browser on Google's consent page with a PKCE challenge
//! 4. Google redirects to the loopback listener with the authorization code
//! 5. Provider exchanges the code for access and refresh tokens
//! 6. Tokens are written to `~/.local/share/caljira/google-tokens-{account}.json`
//!
//! Later runs reuse the token file and refresh the access token when it
//! expires.
//!
//! # Example
//!
//! ```ignore
//! use caljira_providers::google::{GoogleConfig, GoogleProvider, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::from_file("credentials.json")?;
//! let provider = GoogleProvider::new(GoogleConfig::new(credentials))?;
//!
//! if !provider.is_authenticated() {
//!     provider.authenticate().await?;
//! }
//! ```

mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use client::{EventList, EventQuery, GoogleCalendarClient};
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{OAuthClient, PkceFlow};
pub use provider::GoogleProvider;
pub use tokens::{TokenInfo, TokenStorage};
