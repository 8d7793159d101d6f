//! Error types for calendar and tracker operations.
//!
//! Both backends (Google Calendar, Jira) report failures as a
//! [`ProviderError`] carrying a [`ProviderErrorCode`] and, where available,
//! the underlying cause.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// What went wrong, independent of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// 401, a rejected password, or an expired/revoked token.
    AuthenticationFailed,
    /// 403: the account may not touch this resource.
    AuthorizationFailed,
    /// The request never got an HTTP answer.
    NetworkError,
    /// 429.
    RateLimited,
    /// 5xx.
    ServerError,
    /// A body that could not be decoded.
    InvalidResponse,
    /// Resource not found (404), e.g. an unknown ticket.
    NotFound,
    /// Any other 4xx.
    BadRequest,
    /// Local settings are missing or unusable.
    ConfigurationError,
    /// Local failure such as an unwritable token file.
    InternalError,
}

impl ProviderErrorCode {
    /// Stable snake_case name, used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::AuthenticationFailed,
            StatusCode::FORBIDDEN => Self::AuthorizationFailed,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            s if s.is_server_error() => Self::ServerError,
            s if s.is_client_error() => Self::BadRequest,
            _ => Self::InvalidResponse,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a calendar or tracker backend.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The backend that generated this error (e.g., "google:default", "jira").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// Creates an error from a non-success HTTP response.
    ///
    /// The response body is included in the message when non-empty.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        };
        Self::new(ProviderErrorCode::from_status(status), message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Tags the error with the backend name shown in brackets.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Keeps `source` as the cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let error = if err.is_timeout() {
            Self::network("request timeout")
        } else if err.is_connect() {
            Self::network(format!("connection failed: {}", err))
        } else if err.is_decode() {
            Self::invalid_response(format!("failed to decode response: {}", err))
        } else if let Some(status) = err.status() {
            Self::from_status(status, "")
        } else {
            Self::network(format!("request failed: {}", err))
        };
        error.with_source(err)
    }
}

/// Result alias used by every backend call.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_display() {
        assert_eq!(
            ProviderErrorCode::AuthenticationFailed.as_str(),
            "authentication_failed"
        );
        assert_eq!(ProviderErrorCode::NotFound.to_string(), "not_found");
    }

    #[test]
    fn error_code_from_status() {
        use ProviderErrorCode as C;
        assert_eq!(C::from_status(StatusCode::UNAUTHORIZED), C::AuthenticationFailed);
        assert_eq!(C::from_status(StatusCode::FORBIDDEN), C::AuthorizationFailed);
        assert_eq!(C::from_status(StatusCode::NOT_FOUND), C::NotFound);
        assert_eq!(C::from_status(StatusCode::TOO_MANY_REQUESTS), C::RateLimited);
        assert_eq!(C::from_status(StatusCode::BAD_GATEWAY), C::ServerError);
        assert_eq!(C::from_status(StatusCode::UNPROCESSABLE_ENTITY), C::BadRequest);
    }

    #[test]
    fn from_status_includes_body() {
        let err = ProviderError::from_status(StatusCode::NOT_FOUND, " Issue does not exist ");
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
        assert_eq!(err.message(), "HTTP 404 Not Found: Issue does not exist");

        let empty = ProviderError::from_status(StatusCode::BAD_GATEWAY, "");
        assert_eq!(empty.message(), "HTTP 502 Bad Gateway");
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::network("connection refused").with_provider("jira");
        let display = err.to_string();
        assert!(display.contains("[jira]"));
        assert!(display.contains("network_error"));
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn provider_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("disk full");
        let err = ProviderError::internal("failed to write token").with_source(io_err);
        assert!(err.source().is_some());
        assert!(err.provider().is_none());
    }
}
