//! Error types for the Kiln workspace engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Kiln engine.
///
/// Collaborator failures are mapped into these typed variants at the
/// component boundary; nothing below a public operation surfaces a raw
/// transport error.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum KilnError {
    /// Entity not found error with type information
    #[error("{what} not found: '{id}'")]
    NotFound { what: &'static str, id: String },

    /// Access to a path or resource was denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// A collaborator did not answer within the configured deadline
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The remote service could not be reached or reported itself down
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Caller-supplied input the engine cannot act on
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An exclusive slot (analysis, chat, terminal) is already occupied
    #[error("Busy: {0}")]
    Busy(String),

    /// Conflicting concurrent mutation (reserved)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KilnError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Timeout error
    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Creates a ServiceUnavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Creates an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a Busy error
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is a ServiceUnavailable error
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }

    /// Check if this is a Busy error
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for KilnError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found("file", err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Io {
                message: format!("{} (kind: {:?})", err, err.kind()),
            },
        }
    }
}

impl From<serde_json::Error> for KilnError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for KilnError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidArgument(format!("TOML error: {err}"))
    }
}

/// A type alias for `Result<T, KilnError>`.
pub type Result<T> = std::result::Result<T, KilnError>;
