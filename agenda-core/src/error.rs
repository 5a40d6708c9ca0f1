//! Error types for the agenda crates.

use thiserror::Error;

/// Errors that can occur in agenda operations.
#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Recurrence rule error: {0}")]
    Recurrence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for agenda operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
