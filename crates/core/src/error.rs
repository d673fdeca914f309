//! Error type shared by all domain crates.

use thiserror::Error;

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// A deterministic business-rule failure.
///
/// Domain code is IO-free, so a failure here is always a broken rule. Each
/// variant carries just enough text to name the rule; storage and transport
/// failures live in other error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input data is malformed or out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation would put an aggregate into a state it must never reach.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The addressed aggregate does not exist.
    #[error("not found")]
    NotFound,

    /// The operation collides with state that already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
