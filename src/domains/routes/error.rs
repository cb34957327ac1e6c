//! Handler error type.

use thiserror::Error;

use crate::contracts::tasks::ErrorBody;

/// A handler failure. `status` is the HTTP-style status, if the handler knows it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RouteError {
    pub status: Option<u16>,
    pub code: String,
    pub message: String,
}

impl RouteError {
    pub fn new(status: Option<u16>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Invalid caller input (400).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(Some(400), "VALIDATION_ERROR", message)
    }

    /// Missing or rejected credentials (401).
    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Some(401), code, message)
    }

    /// Unknown entity (404).
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Some(404), "NOT_FOUND", message)
    }

    /// Unexpected failure without a status.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(None, "INTERNAL_ERROR", message)
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code.clone(),
            message: self.message.clone(),
        }
    }
}
