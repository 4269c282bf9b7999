//! Capture trait definitions
//!
//! Platform-agnostic seams between the session controller and whatever host
//! facility actually captures the screen.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by a capture capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Capture device is busy")]
    DeviceBusy,

    #[error("Capture unavailable: {0}")]
    Unavailable(String),

    #[error("Device error: {0}")]
    Device(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Constraints passed to the capability when requesting capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConstraints {
    /// Whether to capture audio alongside the screen
    pub capture_audio: bool,

    /// Requested frame rate
    pub frame_rate: u32,

    /// Interval at which the recorder emits data chunks
    pub timeslice_ms: u64,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            capture_audio: true,
            frame_rate: 30,
            timeslice_ms: 1000,
        }
    }
}

/// One timed chunk of encoded media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaChunk {
    pub data: Vec<u8>,

    /// Offset from the start of capture
    pub offset_ms: u64,
}

impl MediaChunk {
    pub fn new(data: Vec<u8>, offset_ms: u64) -> Self {
        Self { data, offset_ms }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Signals pushed by an active device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSignal {
    Data(MediaChunk),
    /// The device stopped producing on its own (track ended, encoder error)
    Failed(String),
}

/// A live capture device returned by [`CaptureCapability::acquire`].
///
/// The device owns the sending half of the chunk stream. Releasing it must
/// drop that sender so the stream ends.
#[async_trait]
pub trait CaptureDevice: Send {
    /// Stable identifier, used in logs
    fn id(&self) -> &str;

    /// Stop producing and flush any buffered chunk into the stream.
    async fn stop(&mut self) -> CaptureResult<()>;

    /// Free host resources. Calling this more than once has no effect.
    fn release(&mut self);

    /// Whether the device still holds host resources
    fn is_active(&self) -> bool;
}

/// Result of a successful acquisition
pub struct AcquiredCapture {
    pub device: Box<dyn CaptureDevice>,
    pub chunks: mpsc::UnboundedReceiver<CaptureSignal>,

    /// MIME type of the chunks this device produces
    pub mime_type: String,
}

impl std::fmt::Debug for AcquiredCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquiredCapture")
            .field("device", &self.device.id())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Host facility able to hand out screen capture devices
#[async_trait]
pub trait CaptureCapability: Send + Sync {
    /// Request capture permission and open a device.
    ///
    /// May suspend on a permission prompt. Dropping the returned future before
    /// it resolves must not leave a device open.
    async fn acquire(&self, constraints: &CaptureConstraints) -> CaptureResult<AcquiredCapture>;
}
