//! Session errors

use super::state::SessionState;
use crate::capture::CaptureError;
use crate::handoff::HandoffError;
use thiserror::Error;

/// Errors returned by session operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Permission refused or device busy. The user has to start again.
    #[error("Capture denied: {0}")]
    CapabilityDenied(String),

    #[error("Capture unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Operation called from a state that does not allow it
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: SessionState,
    },

    #[error("Handoff failed: {0}")]
    Handoff(#[from] HandoffError),
}

impl SessionError {
    pub fn is_capability_denied(&self) -> bool {
        matches!(self, SessionError::CapabilityDenied(_))
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, SessionError::InvalidTransition { .. })
    }
}

impl From<CaptureError> for SessionError {
    fn from(error: CaptureError) -> Self {
        match error {
            CaptureError::PermissionDenied(_) | CaptureError::DeviceBusy => {
                SessionError::CapabilityDenied(error.to_string())
            }
            CaptureError::Unavailable(_) | CaptureError::Device(_) => {
                SessionError::CapabilityUnavailable(error.to_string())
            }
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
