//! ERP Error Types

use thiserror::Error;

/// Errors raised talking to the Logo ERP
///
/// Every variant is a retryable transfer failure from the orchestrator's
/// point of view; the variants exist for diagnostics and session renewal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErpError {
    #[error("Logo authentication failed: HTTP {status}")]
    Authentication { status: u16 },

    #[error("Logo rejected the request: HTTP {status} - {body}")]
    RemoteRejection { status: u16, body: String },

    #[error("Logo connection error: {0}")]
    Network(String),

    #[error("Unexpected Logo response: {0}")]
    MalformedResponse(String),

    #[error("Logo client configuration error: {0}")]
    Config(String),
}

impl ErpError {
    /// True when the remote system refused the bearer token
    #[inline]
    pub fn is_session_rejected(&self) -> bool {
        matches!(self, ErpError::RemoteRejection { status: 401, .. })
    }

    /// Short code for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            ErpError::Authentication { .. } => "ERP_AUTHENTICATION",
            ErpError::RemoteRejection { .. } => "ERP_REJECTED",
            ErpError::Network(_) => "ERP_NETWORK",
            ErpError::MalformedResponse(_) => "ERP_MALFORMED_RESPONSE",
            ErpError::Config(_) => "ERP_CONFIG",
        }
    }
}

impl From<reqwest::Error> for ErpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ErpError::Network(format!("request timed out: {}", e))
        } else if e.is_decode() {
            ErpError::MalformedResponse(e.to_string())
        } else {
            ErpError::Network(e.to_string())
        }
    }
}
