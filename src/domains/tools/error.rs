//! Tool-specific error types and the USER/SYSTEM classification.

use std::fmt;
use thiserror::Error;

use crate::domains::routes::RouteError;

/// Prefix of every error text returned on the tool surface.
pub const ERROR_MARKER: &str = "❌ Error";

/// Errors that can occur while building or looking up tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// An operation's metadata cannot be turned into a tool.
    #[error("Malformed tool metadata for {path}: {reason}")]
    MalformedMetadata { path: String, reason: String },

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "malformed metadata" error.
    pub fn malformed(path: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Who caused a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-caused: bad input, not found, unauthorized (4xx).
    User,
    /// Everything else (5xx or no status).
    System,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::System => "SYSTEM",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure after classification, identical for both invocation surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    /// Status to report; 500 when the raw error carried none.
    pub status: u16,
}

impl ClassifiedError {
    /// Status in `[400, 500)` is USER, anything else SYSTEM.
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let status = status.unwrap_or(500);
        let kind = if (400..500).contains(&status) {
            ErrorKind::User
        } else {
            ErrorKind::System
        };
        Self {
            kind,
            message: message.into(),
            status,
        }
    }

    /// Text payload for the tool surface.
    pub fn to_text(&self) -> String {
        format!("{} [{}]: {}", ERROR_MARKER, self.kind, self.message)
    }
}

impl From<&RouteError> for ClassifiedError {
    fn from(err: &RouteError) -> Self {
        Self::classify(err.status, err.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(ClassifiedError::classify(Some(400), "x").kind, ErrorKind::User);
        assert_eq!(ClassifiedError::classify(Some(404), "x").kind, ErrorKind::User);
        assert_eq!(ClassifiedError::classify(Some(499), "x").kind, ErrorKind::User);
        assert_eq!(ClassifiedError::classify(Some(500), "x").kind, ErrorKind::System);
        assert_eq!(ClassifiedError::classify(Some(302), "x").kind, ErrorKind::System);

        let missing = ClassifiedError::classify(None, "boom");
        assert_eq!(missing.kind, ErrorKind::System);
        assert_eq!(missing.status, 500);
    }

    #[test]
    fn test_error_text() {
        let err = ClassifiedError::from(&RouteError::not_found("Task 1 not found"));
        assert_eq!(err.to_text(), "❌ Error [USER]: Task 1 not found");

        let err = ClassifiedError::from(&RouteError::internal("db down"));
        assert!(err.to_text().starts_with(ERROR_MARKER));
        assert!(err.to_text().contains("[SYSTEM]"));
    }
}
