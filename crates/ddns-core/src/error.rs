//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed fully-qualified domain name
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Address text that cannot be used for the requested operation
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Address source-related errors (router, echo service, host)
    #[error("Address source error: {0}")]
    AddressSource(String),

    /// Listing active records failed
    #[error("Record retrieval failed: {0}")]
    Retrieval(String),

    /// Creating or editing a record failed after all allotted attempts
    #[error("{operation} failed after {attempts} attempt(s): {message}")]
    Mutation {
        /// Operation name ("create" or "edit")
        operation: String,
        /// Number of attempts made
        attempts: usize,
        /// Last error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Registrar-specific error
    #[error("Registrar error ({registrar}): {message}")]
    Registrar {
        /// Registrar name
        registrar: String,
        /// Error message
        message: String,
    },

    /// Operation not offered by this collaborator
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid domain error
    pub fn invalid_domain(msg: impl Into<String>) -> Self {
        Self::InvalidDomain(msg.into())
    }

    /// Create an invalid address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create an address source error
    pub fn address_source(msg: impl Into<String>) -> Self {
        Self::AddressSource(msg.into())
    }

    /// Create a retrieval error
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    /// Create a mutation error
    pub fn mutation(operation: impl Into<String>, attempts: usize, message: impl Into<String>) -> Self {
        Self::Mutation {
            operation: operation.into(),
            attempts,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a registrar-specific error
    pub fn registrar(registrar: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Registrar {
            registrar: registrar.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
