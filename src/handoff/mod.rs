//! Handoff of finished recordings to the upload flow
//!
//! The recorder places a [`TransferRecord`] in a [`HandoffStore`]; the upload
//! flow takes it from there and owns the artifact reference afterwards.

mod record;
mod store;

pub use record::TransferRecord;
pub use store::HandoffStore;

use thiserror::Error;

/// Handoff-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandoffError {
    #[error("Artifact reference is not live: {0}")]
    DanglingReference(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
