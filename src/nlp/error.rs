//! Entity extraction error types

use thiserror::Error;

/// Extraction error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NlpError {
    pub kind: NlpErrorKind,
    pub message: String,
}

impl NlpError {
    pub fn new(kind: NlpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(NlpErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(NlpErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(NlpErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(NlpErrorKind::Auth, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(NlpErrorKind::InvalidResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(NlpErrorKind::Unknown, message)
    }
}

/// Error classification, used for logging only; the dialogue treats every
/// kind the same way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NlpErrorKind {
    /// Timeouts, refused connections
    Network,
    /// 429
    RateLimit,
    /// 5xx
    ServerError,
    /// 401, 403
    Auth,
    /// Body did not match the expected shape
    InvalidResponse,
    Unknown,
}

impl NlpErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
