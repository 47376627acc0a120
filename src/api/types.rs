//! API request and response types

use serde::{Deserialize, Serialize};

/// Inbound message for a conversation
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// The engine's single reply to a message
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
