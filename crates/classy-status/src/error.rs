//! Error types for status operations

use thiserror::Error;
use tokio::sync::watch;

/// Errors reported by the billing repository boundary
///
/// The display text is what status models publish on their error channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backend could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a failure
    #[error("Server rejected request (HTTP {status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message returned by the backend
        message: String,
    },

    /// The call requires a signed-in user
    #[error("User is not signed in")]
    Unauthenticated,
}

/// Errors that can occur in the status layer
#[derive(Error, Debug)]
pub enum StatusError {
    /// Repository call failed
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Push token could not be fetched
    #[error("Push token error: {0}")]
    PushToken(String),

    /// The shared state stopped publishing
    #[error("State source closed")]
    SourceClosed,
}

impl From<toml::de::Error> for StatusError {
    fn from(e: toml::de::Error) -> Self {
        StatusError::Config(e.to_string())
    }
}

/// Publish `message` on an error side channel; repeats of the current message are not republished
pub(crate) fn publish_error(channel: &watch::Sender<Option<String>>, message: String) {
    channel.send_if_modified(|current| {
        if current.as_deref() == Some(message.as_str()) {
            false
        } else {
            *current = Some(message);
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_error_is_not_republished() {
        let (channel, mut errors) = watch::channel(None);

        publish_error(&channel, "Network error: offline".to_string());
        assert!(errors.has_changed().unwrap());
        errors.borrow_and_update();

        publish_error(&channel, "Network error: offline".to_string());
        assert!(!errors.has_changed().unwrap());

        publish_error(&channel, "User is not signed in".to_string());
        assert!(errors.has_changed().unwrap());
        assert_eq!(errors.borrow_and_update().as_deref(), Some("User is not signed in"));
    }

    #[test]
    fn test_repository_error_messages() {
        let err = RepositoryError::Server {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "Server rejected request (HTTP 503): maintenance");
        assert_eq!(RepositoryError::Unauthenticated.to_string(), "User is not signed in");
    }

    #[test]
    fn test_repository_error_conversion() {
        let err: StatusError = RepositoryError::Network("timeout".to_string()).into();
        assert!(matches!(err, StatusError::Repository(RepositoryError::Network(_))));
        assert_eq!(err.to_string(), "Repository error: Network error: timeout");
    }
}
