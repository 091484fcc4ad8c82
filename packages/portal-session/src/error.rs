use thiserror::Error;

use crate::storage::StorageError;

/// Result type for portal operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// How a response failed, independent of which endpoint produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 401. The session is no longer valid anywhere.
    SessionExpired,
    /// HTTP 404, or an envelope carrying `code == 404`.
    NotFound,
    /// Any other non-2xx status.
    RequestFailed,
}

impl FailureKind {
    /// Classify a response by HTTP status and the envelope's embedded code.
    ///
    /// This is the only place the two signals are reconciled; `None` means success.
    pub fn classify(http_status: u16, embedded_code: Option<i64>) -> Option<Self> {
        match http_status {
            401 => Some(FailureKind::SessionExpired),
            404 => Some(FailureKind::NotFound),
            _ if embedded_code == Some(404) => Some(FailureKind::NotFound),
            200..=299 => None,
            _ => Some(FailureKind::RequestFailed),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No response was received (connection failure or timeout)
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The server rejected the credential; the session has been torn down
    #[error("Session expired")]
    SessionExpired,

    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    RequestFailed { status: u16, message: Option<String> },

    /// The response body did not have the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Failed to encode request body: {0}")]
    Encode(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::SessionExpired => Some(401),
            GatewayError::NotFound { .. } => Some(404),
            GatewayError::RequestFailed { status, .. } => Some(*status),
            GatewayError::NetworkUnavailable(_)
            | GatewayError::Decode(_)
            | GatewayError::Encode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
