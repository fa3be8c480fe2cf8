//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Unauthorized`] thrown when the caller cannot be resolved to a user.
//! - [`Forbidden`] thrown when the caller asks for a store outside its scope
//!   or performs an admin-only write.
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`RetryExhausted`] thrown when a contended write keeps failing.
//!
//! Malformed filter input is never an error: the normalizer drops it.
//!
//!  [`Unauthorized`]: EngineError::Unauthorized
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`RetryExhausted`]: EngineError::RetryExhausted
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("storage still busy after {attempts} attempts: {source}")]
    RetryExhausted { attempts: u32, source: DbErr },
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` for errors a caller may retry later without changing the input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidCategory(a), Self::InvalidCategory(b)) => a == b,
            (
                Self::RetryExhausted {
                    attempts: a,
                    source: sa,
                },
                Self::RetryExhausted {
                    attempts: b,
                    source: sb,
                },
            ) => a == b && sa.to_string() == sb.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
