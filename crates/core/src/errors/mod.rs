//! Error types and Result alias for the rewards settlement service

use thiserror::Error;

/// Main error type for the rewards settlement service
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid reward amount: {0}")]
    InvalidAmount(f64),

    #[error("Nothing to claim")]
    NothingToClaim,

    #[error("Missing required field: {0}")]
    MissingFields(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Already claimed: {0}")]
    AlreadyClaimed(String),

    #[error("Chain gateway unavailable: {0}")]
    ChainUnavailable(String),

    #[error("Claim settlement failed: {0}")]
    SettlementFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable category string for structured error responses
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidAmount(_) => "invalid_amount",
            Error::NothingToClaim => "nothing_to_claim",
            Error::MissingFields(_) => "missing_fields",
            Error::UserNotFound(_) => "user_not_found",
            Error::AlreadyClaimed(_) => "already_claimed",
            Error::ChainUnavailable(_) => "chain_unavailable",
            Error::SettlementFailed(_) => "settlement_failed",
            Error::DatabaseError(_) => "database_error",
            Error::EncryptionError(_) => "encryption_error",
            Error::InvalidData(_) => "invalid_data",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::ChainUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
