//! Client error types.

use caljira_providers::ProviderError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Calendar or tracker backend error.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Terminal or file IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging setup failed.
    #[error(transparent)]
    Tracing(#[from] caljira_core::TracingError),

    /// A feature this binary was built without.
    #[error("{0} support is not compiled in")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use caljira_providers::ProviderErrorCode;

    #[test]
    fn provider_error_keeps_message() {
        let err: ClientError = ProviderError::authentication("token revoked")
            .with_provider("google:default")
            .into();
        assert!(matches!(err, ClientError::Provider(ref e) if e.code() == ProviderErrorCode::AuthenticationFailed));
        assert_eq!(
            err.to_string(),
            "[google:default] authentication_failed: token revoked"
        );
    }

    #[test]
    fn config_error_display() {
        let err = ClientError::Config("missing [jira] base_url".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: missing [jira] base_url"
        );
    }
}
