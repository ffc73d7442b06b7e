//! # AppError
//!
//! Centralized error handling for the Agora ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;
use uuid::Uuid;

/// The primary error type for all agora-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Thread, Post, User, Report)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// A post was appended to a thread whose status is `locked`
    #[error("thread {0} is locked")]
    ThreadLocked(Uuid),

    /// A reply referenced a parent post that is missing, lives in another
    /// thread, or is itself a reply
    #[error("invalid parent post: {0}")]
    InvalidParent(String),

    /// A summary row already exists for this (thread, fingerprint) pair.
    /// Recoverable: the loser of the race re-reads the stored row.
    #[error("summary already cached for this fingerprint")]
    DuplicateSummary,

    /// A report was resolved a second time
    #[error("report {0} is already resolved")]
    AlreadyResolved(Uuid),

    /// Registration with an email that is already taken
    #[error("email {0} is already registered")]
    EmailTaken(String),

    /// Validation failure (e.g., empty content, unknown enum value)
    #[error("validation error: {0}")]
    Validation(String),

    /// Security/Auth failure (e.g., bad credentials, missing role)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Other uniqueness/referential violations surfaced from storage
    #[error("conflict: {0}")]
    Conflict(String),

    /// The external summarizer call failed; nothing was persisted and the
    /// operation can be retried as-is
    #[error("summarizer failed: {0}")]
    SummarizerFailed(String),

    /// Infrastructure failure (e.g., DB down, corrupt row)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for Agora logic.
pub type Result<T> = std::result::Result<T, AppError>;
