//! Error types for remote capsule API calls.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for capsule API operations.
pub type CapsuleResult<T> = Result<T, CapsuleError>;

/// Errors returned by a [`crate::CapsuleApi`] backend.
#[derive(Debug, Error)]
pub enum CapsuleError {
    #[error("capsule not found: {0}")]
    NotFound(String),

    #[error("capsule already exists: {0}")]
    Conflict(String),

    #[error("capsule API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("capsule API request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to decode capsule API response: {0}")]
    Decode(String),

    #[error("invalid capsule API endpoint: {0}")]
    InvalidEndpoint(String),
}

impl CapsuleError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CapsuleError::NotFound(_))
    }
}
