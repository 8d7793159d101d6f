//! Jira REST API client for worklogs.
//!
//! Talks to `/rest/api/latest/issue/{ticket}/worklog` with HTTP Basic
//! authentication. Both reading and creating worklogs use the same URL.

use caljira_core::WorklogBody;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::BoxFuture;
use crate::tracker::{RemoteWorklog, TrackerCredentials, WorklogTracker};

use super::config::JiraConfig;

/// Provider name used in errors and logs.
const PROVIDER_NAME: &str = "jira";

/// Jira worklog client.
#[derive(Debug)]
pub struct JiraClient {
    http_client: Client,
    config: JiraConfig,
}

impl JiraClient {
    /// Creates a new Jira client with the given configuration.
    pub fn new(config: JiraConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let http_client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    /// Fetches all worklogs of a ticket.
    #[instrument(skip(self, credentials), fields(user = %credentials.username))]
    pub async fn get_worklogs(
        &self,
        ticket_id: &str,
        credentials: &TrackerCredentials,
    ) -> ProviderResult<Vec<RemoteWorklog>> {
        let url = self.url_for(ticket_id)?;

        let response = self
            .http_client
            .get(url)
            .header(AUTHORIZATION, credentials.basic_auth_header())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::from(e).with_provider(PROVIDER_NAME))?;

        let response = Self::ensure_success(response).await?;

        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e))
                .with_provider(PROVIDER_NAME)
        })?;

        let page: WorklogPage = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse worklogs: {}", e))
                .with_provider(PROVIDER_NAME)
        })?;

        debug!("ticket {} has {} worklogs", ticket_id, page.worklogs.len());
        Ok(page.worklogs)
    }

    /// Creates a worklog on a ticket.
    #[instrument(skip(self, body, credentials), fields(seconds = body.time_spent_seconds))]
    pub async fn add_worklog(
        &self,
        ticket_id: &str,
        body: &WorklogBody,
        credentials: &TrackerCredentials,
    ) -> ProviderResult<()> {
        let url = self.url_for(ticket_id)?;

        let response = self
            .http_client
            .post(url)
            .header(AUTHORIZATION, credentials.basic_auth_header())
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::from(e).with_provider(PROVIDER_NAME))?;

        Self::ensure_success(response).await?;
        debug!("created worklog on {}", ticket_id);
        Ok(())
    }

    fn url_for(&self, ticket_id: &str) -> ProviderResult<url::Url> {
        self.config.worklog_url(ticket_id).map_err(|e| {
            ProviderError::configuration(format!("invalid worklog URL for {}: {}", ticket_id, e))
                .with_provider(PROVIDER_NAME)
        })
    }

    async fn ensure_success(response: Response) -> ProviderResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(status, &body).with_provider(PROVIDER_NAME))
    }
}

impl WorklogTracker for JiraClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_worklogs<'a>(
        &'a self,
        ticket_id: &'a str,
        credentials: &'a TrackerCredentials,
    ) -> BoxFuture<'a, ProviderResult<Vec<RemoteWorklog>>> {
        Box::pin(self.get_worklogs(ticket_id, credentials))
    }

    fn create_worklog<'a>(
        &'a self,
        ticket_id: &'a str,
        body: &'a WorklogBody,
        credentials: &'a TrackerCredentials,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.add_worklog(ticket_id, body, credentials))
    }
}

/// Response from the worklog endpoint.
#[derive(Debug, Deserialize)]
struct WorklogPage {
    #[serde(default)]
    worklogs: Vec<RemoteWorklog>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUTH: &str = "Basic YWxpY2U6c2VjcmV0"; // alice:secret

    fn creds() -> TrackerCredentials {
        TrackerCredentials::new("alice", "secret")
    }

    fn client_for(server: &MockServer) -> JiraClient {
        JiraClient::new(JiraConfig::new(server.uri()).unwrap()).unwrap()
    }

    fn body() -> WorklogBody {
        WorklogBody {
            time_spent_seconds: 2700,
            started: "2024-01-01T09:00:00.000+0000".to_string(),
            comment: "Automated log from calendar: Sprint planning".to_string(),
        }
    }

    #[tokio::test]
    async fn get_worklogs_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/latest/issue/SLPDEV-42/worklog"))
            .and(header("Authorization", AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "startAt": 0,
                "maxResults": 1,
                "total": 1,
                "worklogs": [{
                    "id": "1",
                    "timeSpentSeconds": 2700,
                    "started": "2024-01-01T09:00:00.000+0000",
                    "author": { "name": "alice" }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let worklogs = client_for(&server)
            .get_worklogs("SLPDEV-42", &creds())
            .await
            .unwrap();

        assert_eq!(worklogs.len(), 1);
        assert_eq!(worklogs[0].time_spent_seconds, 2700);
        assert!(worklogs[0].is_authored_by("alice"));
    }

    #[tokio::test]
    async fn get_worklogs_empty_body_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/latest/issue/A-1/worklog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let worklogs = client_for(&server).get_worklogs("A-1", &creds()).await.unwrap();
        assert!(worklogs.is_empty());
    }

    #[tokio::test]
    async fn get_worklogs_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_worklogs("A-1", &creds())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.provider(), Some("jira"));
    }

    #[tokio::test]
    async fn get_worklogs_unknown_ticket() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"errorMessages":["Issue Does Not Exist"]}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_worklogs("NOPE-1", &creds())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
        assert!(err.message().contains("Issue Does Not Exist"));
    }

    #[tokio::test]
    async fn get_worklogs_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_worklogs("A-1", &creds())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }

    #[tokio::test]
    async fn add_worklog_posts_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/latest/issue/SLPDEV-42/worklog"))
            .and(header("Authorization", AUTH))
            .and(body_json(serde_json::json!({
                "timeSpentSeconds": 2700,
                "started": "2024-01-01T09:00:00.000+0000",
                "comment": "Automated log from calendar: Sprint planning"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .add_worklog("SLPDEV-42", &body(), &creds())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn add_worklog_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .add_worklog("A-1", &body(), &creds())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
    }

    #[tokio::test]
    async fn tracker_trait_delegates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "worklogs": [] })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let tracker: &dyn WorklogTracker = &client;
        assert_eq!(tracker.name(), "jira");
        assert!(tracker.list_worklogs("A-1", &creds()).await.unwrap().is_empty());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = JiraConfig::new("ftp://jira.example.com").unwrap();
        let err = JiraClient::new(config).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }
}
