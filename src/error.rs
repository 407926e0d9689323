//! Error types and handling for Loadshare
//!
//! This module defines the error types used throughout the crate. The
//! arbitration primitives (coordinator, prioritizer) never return errors;
//! only configuration, durable storage and the profile query do.

use thiserror::Error;

/// Result type alias for Loadshare operations
pub type Result<T> = std::result::Result<T, LoadshareError>;

/// Main error type for Loadshare
#[derive(Debug, Error)]
pub enum LoadshareError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Durable metrics store errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// Not enough history to build a full daily profile
    #[error("Incomplete profile: {found} of {expected} slots available")]
    IncompleteProfile { found: usize, expected: usize },

    /// Vehicle or loadpoint status read errors
    #[error("Status error: {message}")]
    Status { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl LoadshareError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        LoadshareError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        LoadshareError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        LoadshareError::Io {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        LoadshareError::Store {
            message: message.into(),
        }
    }

    /// Create a new incomplete profile error
    pub fn incomplete_profile(found: usize, expected: usize) -> Self {
        LoadshareError::IncompleteProfile { found, expected }
    }

    /// Create a new status error
    pub fn status<S: Into<String>>(message: S) -> Self {
        LoadshareError::Status {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        LoadshareError::Generic {
            message: message.into(),
        }
    }

    /// Whether this error only means that history is still too short
    pub fn is_incomplete_profile(&self) -> bool {
        matches!(self, LoadshareError::IncompleteProfile { .. })
    }
}

impl From<std::io::Error> for LoadshareError {
    fn from(err: std::io::Error) -> Self {
        LoadshareError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for LoadshareError {
    fn from(err: serde_yaml::Error) -> Self {
        LoadshareError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LoadshareError {
    fn from(err: serde_json::Error) -> Self {
        LoadshareError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for LoadshareError {
    fn from(err: rusqlite::Error) -> Self {
        LoadshareError::store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoadshareError::config("test config error");
        assert!(matches!(err, LoadshareError::Config { .. }));

        let err = LoadshareError::store("disk full");
        assert!(matches!(err, LoadshareError::Store { .. }));

        let err = LoadshareError::validation("field", "test validation error");
        assert!(matches!(err, LoadshareError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoadshareError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = LoadshareError::incomplete_profile(12, 96);
        assert_eq!(
            format!("{}", err),
            "Incomplete profile: 12 of 96 slots available"
        );
        assert!(err.is_incomplete_profile());
        assert!(!LoadshareError::store("x").is_incomplete_profile());
    }
}
