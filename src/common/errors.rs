//! Error types for the application

use thiserror::Error;

use crate::positions::types::PositionStatus;

/// Result type alias using our TraderError
pub type Result<T> = std::result::Result<T, TraderError>;

/// Main error type for engine and collaborator operations
#[derive(Error, Debug)]
pub enum TraderError {
    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Rejected caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Market not found
    #[error("Market not found: {0}")]
    MarketNotFound(String),

    /// Tracked position not found
    #[error("Position not found: {0}")]
    PositionNotFound(String),

    /// Status change that would reverse a terminal state
    #[error("Invalid transition for position {position_id}: {from} -> {to}")]
    InvalidTransition {
        position_id: String,
        from: PositionStatus,
        to: PositionStatus,
    },

    /// Ledger read/write failures
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Notification delivery failures
    #[error("Notification error: {0}")]
    Notification(String),

    /// Unknown model runner
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for TraderError {
    fn from(err: std::io::Error) -> Self {
        TraderError::Ledger(err.to_string())
    }
}
