//! Unified error system for Totem
//!
//! A single, flat error type shared by every crate in the workspace. Domain
//! crates keep their own richer error enums and convert into this one at
//! crate boundaries.

use serde::{Deserialize, Serialize};

/// Unified error type for all Totem operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum TotemError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Permission denied
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Error message describing the permission issue
        message: String,
    },

    /// Operation conflicts with existing state
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message describing the conflicting state
        message: String,
    },

    /// An external collaborator failed
    #[error("External error: {message}")]
    External {
        /// Error message describing the collaborator failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl TotemError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an external collaborator error
    pub fn external(message: impl Into<String>) -> Self {
        Self::External {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Prefix the error message with additional context, keeping the variant
    pub fn with_context(self, context: impl AsRef<str>) -> Self {
        let context = context.as_ref();
        match self {
            TotemError::Invalid { message } => TotemError::invalid(format!("{context}: {message}")),
            TotemError::NotFound { message } => {
                TotemError::not_found(format!("{context}: {message}"))
            }
            TotemError::PermissionDenied { message } => {
                TotemError::permission_denied(format!("{context}: {message}"))
            }
            TotemError::Conflict { message } => {
                TotemError::conflict(format!("{context}: {message}"))
            }
            TotemError::External { message } => {
                TotemError::external(format!("{context}: {message}"))
            }
            TotemError::Serialization { message } => {
                TotemError::serialization(format!("{context}: {message}"))
            }
            TotemError::Internal { message } => {
                TotemError::internal(format!("{context}: {message}"))
            }
        }
    }
}

/// Standard Result type for Totem operations
pub type Result<T> = std::result::Result<T, TotemError>;

impl From<serde_json::Error> for TotemError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for TotemError {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid(format!("Invalid TOML: {err}"))
    }
}

impl From<std::io::Error> for TotemError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}
