//! Error types for the wager ledger.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to read or write the backing store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// State snapshot (de)serialization error
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// CSV output error
    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    /// Referenced user does not exist
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Referenced match does not exist
    #[error("Match not found: {0}")]
    MatchNotFound(Uuid),

    /// Caller lacks permission for the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Username or email already taken
    #[error("Duplicate {field}: {value}")]
    DuplicateUser { field: &'static str, value: String },

    /// PIN is not exactly 6 ASCII digits
    #[error("Invalid PIN: must be exactly 6 digits")]
    InvalidPin,

    /// Email/PIN pair does not match any account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account exists but is blocked
    #[error("Account is blocked")]
    AccountBlocked,

    /// Account exists but was soft-deleted
    #[error("Account was deleted")]
    AccountDeleted,

    /// Backing store rejected the operation
    #[error("Store error: {0}")]
    Store(String),

    /// Bad command-line invocation
    #[error("Usage error: {0}")]
    Usage(String),
}
