//! Unified error type for the session policy engine
//!
//! A single error enum is shared by every crate in the workspace. Partial or
//! stale on-chain state is never an error here; the reconciler skips it.

use serde::{Deserialize, Serialize};

/// Unified error type for all session engine operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SsoError {
    /// A limit, spec, or engine configuration is not acceptable
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message describing the rejected configuration
        message: String,
    },

    /// JSON/TOML parsing or canonical formatting failure
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// ABI encoding or decoding failure
    #[error("Encoding error: {message}")]
    Encoding {
        /// Error message describing the encoding failure
        message: String,
    },

    /// Lookup target not present (e.g. no policy covers a transaction)
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// A session state predicate did not hold
    #[error("State check failed on {field}: {message}")]
    StateCheckFailed {
        /// Session state field that was checked
        field: String,
        /// Expectation and actual value
        message: String,
    },

    /// Internal or collaborator failure
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl SsoError {
    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a failed state check error
    pub fn state_check(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StateCheckFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors caused by a rejected configuration
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }
}

/// Standard Result type for session engine operations
pub type SsoResult<T> = std::result::Result<T, SsoError>;

impl From<serde_json::Error> for SsoError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SsoError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for SsoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}
