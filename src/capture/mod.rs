//! Screen capture seams
//!
//! The capability traits the session controller consumes, the scoped device
//! handle, and an in-process capability for hosts without a capture stack.

pub mod handle;
pub mod synthetic;
pub mod traits;

pub use handle::DeviceHandle;
pub use synthetic::{PermissionOutcome, SyntheticCapture, SyntheticOptions};
pub use traits::{
    AcquiredCapture, CaptureCapability, CaptureConstraints, CaptureDevice, CaptureError,
    CaptureResult, CaptureSignal, MediaChunk,
};
