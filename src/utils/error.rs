//! Error types and handling
//!
//! Common error types used across the application.

use crate::db::DatabaseError;
use crate::handoff::HandoffError;
use crate::recorder::SessionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Handoff error: {0}")]
    Handoff(#[from] HandoffError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Error response for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Session(SessionError::CapabilityDenied(_)) => "CAPTURE_DENIED",
            AppError::Session(SessionError::CapabilityUnavailable(_)) => "CAPTURE_UNAVAILABLE",
            AppError::Session(SessionError::InvalidTransition { .. }) => "INVALID_TRANSITION",
            AppError::Session(SessionError::Handoff(_)) | AppError::Handoff(_) => "HANDOFF_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<SessionError> for ErrorResponse {
    fn from(error: SessionError) -> Self {
        AppError::from(error).into()
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
