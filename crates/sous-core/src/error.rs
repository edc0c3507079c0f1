//! Error types for the Sous Chef session core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole session core.
///
/// The first four variants are the user-facing error kinds of the recipe
/// workflow; the rest cover configuration and plumbing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SousError {
    /// Input rejected locally (missing meal type, missing custom text).
    /// No network call is made and no state changes.
    #[error("{0}")]
    Validation(String),

    /// Network or non-success response from the backend.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// An expected recipe section could not be located.
    #[error("{0}")]
    Extraction(String),

    /// The recipe has no usable instruction table, so cooking mode cannot start.
    #[error("{0}")]
    Sequencing(String),

    /// An action was attempted from a view that does not allow it.
    #[error("Cannot {action} from the {view} view")]
    InvalidTransition { view: String, action: String },

    /// The same action already has a request in flight.
    #[error("A {0} request is already in progress")]
    RequestPending(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SousError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Transport error with an optional HTTP status.
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Creates a Transport error from a failure status and an optional
    /// server-provided message.
    ///
    /// The server message is used verbatim when present; otherwise a generic
    /// status-derived message is produced.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        let message = server_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Server error: {status}"));
        Self::Transport {
            status: Some(status),
            message,
        }
    }

    /// Creates an Extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Creates a Sequencing error
    pub fn sequencing(message: impl Into<String>) -> Self {
        Self::Sequencing(message.into())
    }

    /// Creates an InvalidTransition error
    pub fn invalid_transition(view: impl ToString, action: impl Into<String>) -> Self {
        Self::InvalidTransition {
            view: view.to_string(),
            action: action.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a Sequencing error
    pub fn is_sequencing(&self) -> bool {
        matches!(self, Self::Sequencing(_))
    }

    /// Check if this is an InvalidTransition error
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }

    /// Check if this is a RequestPending error
    pub fn is_request_pending(&self) -> bool {
        matches!(self, Self::RequestPending(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for SousError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for SousError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SousError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for SousError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for SousError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, SousError>`.
pub type Result<T> = std::result::Result<T, SousError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_prefers_server_message() {
        let err = SousError::from_status(502, Some("Chef agent unavailable".to_string()));
        assert_eq!(err.to_string(), "Chef agent unavailable");
        assert!(err.is_transport());
    }

    #[test]
    fn test_from_status_falls_back_to_status() {
        let err = SousError::from_status(500, None);
        assert_eq!(err.to_string(), "Server error: 500");

        let blank = SousError::from_status(404, Some("  ".to_string()));
        assert_eq!(blank.to_string(), "Server error: 404");
    }

    #[test]
    fn test_extraction_message_is_verbatim() {
        let err = SousError::extraction("Could not find the \"Instructions\" table in this recipe.");
        assert_eq!(
            err.to_string(),
            "Could not find the \"Instructions\" table in this recipe."
        );
        assert!(matches!(err, SousError::Extraction(_)));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = SousError::invalid_transition("Requesting", "enter cooking mode");
        assert_eq!(
            err.to_string(),
            "Cannot enter cooking mode from the Requesting view"
        );
    }
}
