//! [`CalendarProvider`] implementation for Google Calendar.

use tokio::sync::RwLock as TokioRwLock;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarProvider, FetchOptions, FetchResult};

use super::client::{EventQuery, GoogleCalendarClient};
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenStorage;

/// Google Calendar provider.
///
/// Loads stored tokens at construction, refreshes them when they expire
/// and runs the browser flow on [`CalendarProvider::authenticate`].
pub struct GoogleProvider {
    config: GoogleConfig,
    display_name: String,
    token_storage: TokenStorage,
    oauth_client: OAuthClient,
    api_client: TokioRwLock<Option<GoogleCalendarClient>>,
}

impl GoogleProvider {
    /// Creates a new Google provider with the given configuration.
    ///
    /// Existing tokens are loaded, but no network call is made. A token
    /// file that cannot be parsed is ignored with a warning and the user
    /// is asked to authorize again.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let display_name = config.provider_name();
        let token_storage = TokenStorage::new(&config.token_path);
        if let Err(e) = token_storage.load() {
            warn!("ignoring stored Google tokens: {}", e);
        }

        let oauth_client = OAuthClient::new(config.credentials.clone(), config.timeout)?;

        Ok(Self {
            config,
            display_name,
            token_storage,
            oauth_client,
            api_client: TokioRwLock::new(None),
        })
    }

    /// Returns the provider configuration.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Returns true if stored tokens are missing or lack a configured scope.
    pub fn needs_reauth(&self) -> bool {
        self.token_storage.needs_reauth(&self.config.scopes)
    }

    /// Forgets the stored tokens.
    pub async fn logout(&self) -> ProviderResult<()> {
        *self.api_client.write().await = None;
        self.token_storage.clear()
    }

    fn new_api_client(&self, access_token: &str) -> ProviderResult<GoogleCalendarClient> {
        Ok(GoogleCalendarClient::new(
            access_token,
            self.config.timeout,
            &self.config.user_agent,
        )?
        .with_api_base(&self.config.api_base))
    }

    async fn authorize(&self) -> ProviderResult<()> {
        info!("starting Google authorization for {}", self.display_name);

        let tokens = self
            .oauth_client
            .authorize(&self.config.scopes, self.config.loopback_port_range)
            .await?;
        self.token_storage.set(tokens.clone())?;

        let client = self.new_api_client(&tokens.access_token)?;
        *self.api_client.write().await = Some(client);

        info!("stored Google tokens at {}", self.token_storage.path().display());
        Ok(())
    }

    /// Makes sure an API client with a live access token exists.
    async fn ensure_authenticated(&self) -> ProviderResult<()> {
        let tokens = self.token_storage.get().ok_or_else(|| {
            ProviderError::authentication("not authenticated, run 'caljira auth google'")
        })?;

        let mut client = self.api_client.write().await;

        if tokens.is_expired() {
            let refresh_token = tokens.refresh_token.as_deref().ok_or_else(|| {
                ProviderError::authentication("access token expired and no refresh token stored")
            })?;

            debug!("refreshing expired access token");
            let (access_token, expires_in) = self.oauth_client.refresh_token(refresh_token).await?;
            self.token_storage
                .update_access_token(&access_token, expires_in)?;

            match client.as_mut() {
                Some(c) => c.set_access_token(&access_token),
                None => *client = Some(self.new_api_client(&access_token)?),
            }
        } else if client.is_none() {
            *client = Some(self.new_api_client(&tokens.access_token)?);
        }

        Ok(())
    }

    async fn fetch(&self, options: &FetchOptions) -> ProviderResult<FetchResult> {
        self.ensure_authenticated()
            .await
            .map_err(|e| e.with_provider(&self.display_name))?;

        let client = self.api_client.read().await;
        let client = client
            .as_ref()
            .ok_or_else(|| ProviderError::internal("API client not available"))?;

        let calendar_id = &self.config.calendar_id;
        debug!("fetching events from calendar {}", calendar_id);
        let query = EventQuery {
            calendar_id,
            time_min: options.time_window.start,
            time_max: options.time_window.end,
            max_results: options.max_results,
            single_events: options.expand_recurring,
        };
        let list = client
            .list_events(&query)
            .await
            .map_err(|e| e.with_provider(&self.display_name))?;

        if list.truncated {
            warn!(
                "calendar {} has more events than the limit of {}",
                calendar_id,
                options.max_results.unwrap_or_default()
            );
        }

        Ok(FetchResult {
            events: list.events,
            truncated: list.truncated,
        })
    }
}

impl CalendarProvider for GoogleProvider {
    fn name(&self) -> &str {
        &self.display_name
    }

    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>> {
        Box::pin(async move { self.fetch(&options).await })
    }

    fn is_authenticated(&self) -> bool {
        self.token_storage
            .get()
            .is_some_and(|tokens| !tokens.is_expired() || tokens.refresh_token.is_some())
    }

    fn authenticate(&self) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            self.authorize()
                .await
                .map_err(|e| e.with_provider(&self.display_name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::google::config::OAuthCredentials;
    use crate::google::tokens::TokenInfo;
    use caljira_core::TimeWindow;
    use chrono::Utc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(dir: &tempfile::TempDir) -> GoogleConfig {
        let credentials =
            OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret");
        GoogleConfig::new(credentials).with_token_path(dir.path().join("tokens.json"))
    }

    fn seed_tokens(config: &GoogleConfig, access_token: &str) {
        TokenStorage::new(&config.token_path)
            .set(TokenInfo::new(
                access_token,
                Some("refresh".to_string()),
                Some(3600),
                vec![GoogleConfig::DEFAULT_SCOPE.to_string()],
            ))
            .unwrap();
    }

    #[test]
    fn provider_creation() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GoogleProvider::new(test_config(&dir)).unwrap();
        assert_eq!(provider.name(), "google:default");
        assert!(!provider.is_authenticated());
        assert!(provider.needs_reauth());
    }

    #[test]
    fn provider_name_with_account() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GoogleProvider::new(test_config(&dir).with_account_name("work")).unwrap();
        assert_eq!(provider.name(), "google:work");
    }

    #[test]
    fn provider_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir).with_scopes(vec![]);
        let err = GoogleProvider::new(config).err().unwrap();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }

    #[test]
    fn provider_survives_corrupt_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        std::fs::write(&config.token_path, "garbage").unwrap();

        let provider = GoogleProvider::new(config).unwrap();
        assert!(!provider.is_authenticated());
    }

    #[tokio::test]
    async fn fetch_without_tokens_fails() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GoogleProvider::new(test_config(&dir)).unwrap();

        let now = Utc::now();
        let window = TimeWindow::new(now - chrono::Duration::days(7), now);
        let err = provider.fetch_events(FetchOptions::new(window)).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.provider(), Some("google:default"));
    }

    #[tokio::test]
    async fn fetch_uses_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(header("Authorization", "Bearer stored-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "e1",
                    "summary": "Sprint planning",
                    "start": { "dateTime": "2024-01-01T09:00:00Z" },
                    "end": { "dateTime": "2024-01-01T09:45:00Z" }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir).with_api_base(server.uri());
        seed_tokens(&config, "stored-token");

        let provider = GoogleProvider::new(config).unwrap();
        assert!(provider.is_authenticated());
        assert!(!provider.needs_reauth());

        let now = Utc::now();
        let options = FetchOptions::new(TimeWindow::new(now - chrono::Duration::days(7), now))
            .with_max_results(500)
            .with_expand_recurring(true);
        let result = provider.fetch_events(options).await.unwrap();

        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].summary_text(), "Sprint planning");
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn logout_clears_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        seed_tokens(&config, "stored-token");

        let provider = GoogleProvider::new(config).unwrap();
        assert!(provider.is_authenticated());
        provider.logout().await.unwrap();
        assert!(!provider.is_authenticated());
    }
}
