//! Scoped ownership of an active capture device

use super::traits::{CaptureDevice, CaptureResult};

/// Exclusive, scoped ownership of one capture device.
///
/// The device is released exactly once: either by an explicit
/// [`DeviceHandle::release`] or when the handle is dropped.
pub struct DeviceHandle {
    device: Box<dyn CaptureDevice>,
    released: bool,
}

impl DeviceHandle {
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        tracing::debug!("Device handle opened: {}", device.id());
        Self {
            device,
            released: false,
        }
    }

    pub fn id(&self) -> &str {
        self.device.id()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Ask the device to stop and flush. Does not release it.
    pub async fn stop(&mut self) -> CaptureResult<()> {
        if self.released {
            return Ok(());
        }
        self.device.stop().await
    }

    /// Release the device. Subsequent calls do nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.device.release();
        tracing::debug!("Device handle released: {}", self.device.id());
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!("Device handle {} dropped while open, releasing", self.device.id());
            self.release();
        }
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("id", &self.device.id())
            .field("released", &self.released)
            .finish()
    }
}
