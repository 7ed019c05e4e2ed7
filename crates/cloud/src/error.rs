//! Error types for the cloud client crate.

use apiario_core::remote::RemoteError;
use thiserror::Error;

/// Result type alias for cloud client operations.
pub type Result<T> = std::result::Result<T, CloudError>;

/// Errors that can occur talking to the cloud table service.
#[derive(Debug, Error)]
pub enum CloudError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the cloud service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication error (missing or malformed credentials)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl CloudError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<CloudError> for RemoteError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::Http(e) => RemoteError::Transport(e.to_string()),
            CloudError::Json(e) => RemoteError::Transport(format!("invalid response body: {e}")),
            CloudError::Api { status, message } => RemoteError::Api { status, message },
            CloudError::Auth(message) => RemoteError::Auth(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiario_core::remote::RetryClass;

    #[test]
    fn api_errors_keep_their_status_across_the_boundary() {
        let err = CloudError::api(503, "service unavailable");
        assert_eq!(err.status_code(), Some(503));

        let remote: RemoteError = err.into();
        assert_eq!(remote.status_code(), Some(503));
        assert_eq!(remote.retry_class(), RetryClass::Retryable);
    }

    #[test]
    fn auth_errors_map_to_reauth() {
        let remote: RemoteError = CloudError::auth("bad token").into();
        assert_eq!(remote.retry_class(), RetryClass::ReauthRequired);
    }
}
