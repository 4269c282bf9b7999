//! Recording session module
//!
//! This module implements the capture session lifecycle:
//! - CaptureSessionController, the idle/recording/stopped state machine
//! - ChunkCollector and ElapsedTimer, the background work of a recording
//! - ObjectUrlRegistry for locally resolvable artifact references

mod chunks;
pub mod config;
pub mod controller;
pub mod error;
pub mod state;
mod timer;
pub mod urls;

pub use config::RecorderConfig;
pub use controller::{CaptureSessionController, SessionEvent};
pub use error::{SessionError, SessionResult};
pub use state::{Artifact, ArtifactUrl, SessionSnapshot, SessionState, StopReport, StopWarning};
pub use urls::ObjectUrlRegistry;
