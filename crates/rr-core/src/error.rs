//! # AppError
//!
//! Centralized error handling for the Rusty-Rank engine.
//! Domain outcomes such as a rejected vote are not errors; see [`crate::models::VoteOutcome`].

use thiserror::Error;

/// The primary error type for all rr-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Malformed caller input (e.g., empty title, zero page size).
    /// Raised before any storage round trip.
    #[error("validation error: {0}")]
    Validation(String),

    /// The storage engine is unreachable or a round trip failed / timed out.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Stored data could not be interpreted (e.g., a non-numeric vote count,
    /// or a key holding the wrong kind of value).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// A specialized Result type for Rusty-Rank logic.
pub type Result<T> = std::result::Result<T, AppError>;
