//! Error types for the Daybook core library

use thiserror::Error;

/// Result type alias for Daybook operations
pub type Result<T> = std::result::Result<T, DaybookError>;

/// Main error type for Daybook operations
///
/// Variants carry plain messages so the error is `Clone` and can be
/// published through watch channels by live queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DaybookError {
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid construction state: {message}")]
    InvalidConstructionState { message: String },

    #[error("Event not found: {id}")]
    EventNotFound { id: i64 },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DaybookError {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an invalid construction state error
    pub fn invalid_construction(message: impl Into<String>) -> Self {
        Self::InvalidConstructionState {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error came from the persistence layer
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

impl From<sqlx::Error> for DaybookError {
    fn from(error: sqlx::Error) -> Self {
        Self::storage(error.to_string())
    }
}

impl From<serde_yaml::Error> for DaybookError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<std::io::Error> for DaybookError {
    fn from(error: std::io::Error) -> Self {
        Self::configuration(error.to_string())
    }
}
