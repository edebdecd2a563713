//! Client error taxonomy shared by every component.

use thiserror::Error;

/// Generic text shown when the backend rejects a request without a message.
pub const GENERIC_REJECTION: &str = "The server could not process the request";

/// Shown for transport failures.
pub const NETWORK_HINT: &str = "Could not reach the server. Check your connection and try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Malformed local input, detected before any network call.
    #[error("{0}")]
    Validation(String),

    /// Credentials rejected or session expired.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Server rejected the request ({status}): {}", .message.as_deref().unwrap_or(GENERIC_REJECTION))]
    ServerRejection {
        status: u16,
        message: Option<String>,
    },

    /// Transport-level failure, no response received.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not signed in")]
    NotAuthenticated,

    /// The session was invalidated while this call was in flight.
    #[error("Session was invalidated while the request was in flight")]
    SessionInvalidated,

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Job {id} has unrecognized status '{status}'")]
    UnknownStatus { id: i64, status: String },

    #[error("Job {id} is not completed (status: {status})")]
    JobNotReady { id: i64, status: String },

    #[error("Invalid upload phase transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a failure, carried by terminal upload events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    ServerRejection,
    Network,
    NotFound,
    Cancelled,
    Internal,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidTransition { .. } => ErrorKind::Validation,
            Self::Auth(_) | Self::NotAuthenticated | Self::SessionInvalidated => ErrorKind::Auth,
            Self::ServerRejection { .. } | Self::UploadInProgress | Self::JobNotReady { .. } => {
                ErrorKind::ServerRejection
            }
            Self::Network(_) => ErrorKind::Network,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::UnknownStatus { .. } | Self::Decode(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Text suitable for showing to the user.
    ///
    /// Server messages are surfaced verbatim when present; network failures get
    /// a retry hint since nothing is retried automatically.
    pub fn user_message(&self) -> String {
        match self {
            Self::ServerRejection { message, .. } => message
                .clone()
                .unwrap_or_else(|| GENERIC_REJECTION.to_string()),
            Self::Network(_) => NETWORK_HINT.to_string(),
            Self::Auth(_) | Self::NotAuthenticated | Self::SessionInvalidated => {
                "Your session has ended. Please sign in again.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
