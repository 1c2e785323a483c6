//! Error types for Teabridge

use crate::types::ResultCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Underlying driver error carried by [`Error::DatabaseError`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    // DN Errors
    #[error("Invalid DN: {0}")]
    InvalidDnSyntax(String),

    // Access Errors
    #[error("Search Error: {0}")]
    InsufficientAccess(String),

    // Request Errors
    #[error("Search Error: {0}")]
    UnsupportedFilter(String),

    // Upstream Errors
    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    DatabaseError(#[source] BoxError),

    // Internal Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// LDAP result code reported to the client for this error
    pub fn result_code(&self) -> ResultCode {
        match self {
            Error::InvalidDnSyntax(_) => ResultCode::InvalidDnSyntax,
            Error::InsufficientAccess(_) => ResultCode::InsufficientAccessRights,
            Error::UnsupportedFilter(_)
            | Error::Provider(_)
            | Error::DatabaseError(_)
            | Error::ConfigError(_)
            | Error::Serialization(_) => ResultCode::OperationsError,
        }
    }
}
