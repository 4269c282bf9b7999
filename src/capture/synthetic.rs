//! In-process capture capability
//!
//! Produces fixed-size chunks on a timer instead of reading a real display.
//! Used by the demo binary and to exercise the session controller without a
//! host capture stack.

use super::traits::{
    AcquiredCapture, CaptureCapability, CaptureConstraints, CaptureDevice, CaptureError,
    CaptureResult, CaptureSignal, MediaChunk,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// How the simulated permission prompt resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    Busy,
    Unavailable,
}

/// Behaviour of a [`SyntheticCapture`]
#[derive(Debug, Clone)]
pub struct SyntheticOptions {
    pub permission: PermissionOutcome,

    /// Time spent "showing" the permission prompt
    pub prompt_delay: Duration,

    pub chunk_size: usize,

    /// Stop producing after this many chunks (stream stays open)
    pub max_chunks: Option<usize>,

    /// Report a device fault after this many chunks
    pub fail_after: Option<usize>,

    /// Push one last chunk when stopped
    pub flush_on_stop: bool,

    /// Make `stop` fail without flushing
    pub fail_on_stop: bool,

    pub mime_type: String,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            permission: PermissionOutcome::Granted,
            prompt_delay: Duration::ZERO,
            chunk_size: 1024,
            max_chunks: None,
            fail_after: None,
            flush_on_stop: false,
            fail_on_stop: false,
            mime_type: "video/webm".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct DeviceCounters {
    acquisitions: AtomicUsize,
    open: AtomicUsize,
    releases: AtomicUsize,
}

/// Timer-driven capture capability
pub struct SyntheticCapture {
    options: Mutex<SyntheticOptions>,
    counters: Arc<DeviceCounters>,
    next_id: AtomicUsize,
}

impl SyntheticCapture {
    pub fn new(options: SyntheticOptions) -> Self {
        Self {
            options: Mutex::new(options),
            counters: Arc::new(DeviceCounters::default()),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Change how the next permission prompt resolves
    pub fn set_permission(&self, permission: PermissionOutcome) {
        self.options.lock().permission = permission;
    }

    pub fn set_options(&self, options: SyntheticOptions) {
        *self.options.lock() = options;
    }

    /// Number of devices successfully handed out
    pub fn acquisitions(&self) -> usize {
        self.counters.acquisitions.load(Ordering::SeqCst)
    }

    /// Number of devices currently holding resources
    pub fn open_devices(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }

    /// Number of device releases that actually freed something
    pub fn releases(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self::new(SyntheticOptions::default())
    }
}

#[async_trait]
impl CaptureCapability for SyntheticCapture {
    async fn acquire(&self, constraints: &CaptureConstraints) -> CaptureResult<AcquiredCapture> {
        let options = self.options.lock().clone();

        if !options.prompt_delay.is_zero() {
            tokio::time::sleep(options.prompt_delay).await;
        }

        match options.permission {
            PermissionOutcome::Granted => {}
            PermissionOutcome::Denied => {
                return Err(CaptureError::PermissionDenied(
                    "Screen capture was not allowed".to_string(),
                ))
            }
            PermissionOutcome::Busy => return Err(CaptureError::DeviceBusy),
            PermissionOutcome::Unavailable => {
                return Err(CaptureError::Unavailable(
                    "No display available for capture".to_string(),
                ))
            }
        }

        let index = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        let mime_type = options.mime_type.clone();
        let device = SyntheticDevice::start(
            format!("synthetic-{}", index),
            options,
            constraints,
            tx,
            self.counters.clone(),
        );

        self.counters.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.counters.open.fetch_add(1, Ordering::SeqCst);

        tracing::info!(
            "Synthetic capture acquired: {} (audio: {}, {}fps, timeslice {}ms)",
            device.id,
            constraints.capture_audio,
            constraints.frame_rate,
            constraints.timeslice_ms
        );

        Ok(AcquiredCapture {
            device: Box::new(device),
            chunks: rx,
            mime_type,
        })
    }
}

fn payload(index: usize, size: usize) -> Vec<u8> {
    vec![(index % 256) as u8; size]
}

struct SyntheticDevice {
    id: String,
    options: SyntheticOptions,
    active: Arc<AtomicBool>,
    sender: Arc<Mutex<Option<mpsc::UnboundedSender<CaptureSignal>>>>,
    produced: Arc<AtomicUsize>,
    started_at: Instant,
    capture_handle: Option<tokio::task::JoinHandle<()>>,
    released: bool,
    counters: Arc<DeviceCounters>,
}

impl SyntheticDevice {
    fn start(
        id: String,
        options: SyntheticOptions,
        constraints: &CaptureConstraints,
        tx: mpsc::UnboundedSender<CaptureSignal>,
        counters: Arc<DeviceCounters>,
    ) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let sender = Arc::new(Mutex::new(Some(tx)));
        let produced = Arc::new(AtomicUsize::new(0));
        let timeslice = Duration::from_millis(constraints.timeslice_ms.max(1));

        let handle = {
            let active = active.clone();
            let sender = sender.clone();
            let produced = produced.clone();
            let options = options.clone();
            let id = id.clone();

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(timeslice);
                ticker.tick().await;

                loop {
                    ticker.tick().await;
                    if !active.load(Ordering::SeqCst) {
                        break;
                    }

                    let count = produced.load(Ordering::SeqCst);
                    if options.fail_after == Some(count) {
                        if let Some(tx) = sender.lock().as_ref() {
                            let _ = tx.send(CaptureSignal::Failed(format!(
                                "{} stopped producing after {} chunks",
                                id, count
                            )));
                        }
                        break;
                    }
                    if options.max_chunks.is_some_and(|max| count >= max) {
                        break;
                    }

                    let offset_ms = (count as u64 + 1) * timeslice.as_millis() as u64;
                    let chunk = MediaChunk::new(payload(count, options.chunk_size), offset_ms);
                    let sent = sender
                        .lock()
                        .as_ref()
                        .map(|tx| tx.send(CaptureSignal::Data(chunk)).is_ok())
                        .unwrap_or(false);
                    if !sent {
                        break;
                    }
                    produced.fetch_add(1, Ordering::SeqCst);
                }

                tracing::debug!(
                    "Synthetic capture loop for {} ended after {} chunks",
                    id,
                    produced.load(Ordering::SeqCst)
                );
            })
        };

        Self {
            id,
            options,
            active,
            sender,
            produced,
            started_at: Instant::now(),
            capture_handle: Some(handle),
            released: false,
            counters,
        }
    }
}

#[async_trait]
impl CaptureDevice for SyntheticDevice {
    fn id(&self) -> &str {
        &self.id
    }

    async fn stop(&mut self) -> CaptureResult<()> {
        self.active.store(false, Ordering::SeqCst);

        if let Some(handle) = self.capture_handle.take() {
            handle.abort();
            let _ = handle.await;
        }

        if self.options.fail_on_stop {
            return Err(CaptureError::Device(format!(
                "{} failed to finalize its last chunk",
                self.id
            )));
        }

        if self.options.flush_on_stop {
            let count = self.produced.load(Ordering::SeqCst);
            let offset_ms = self.started_at.elapsed().as_millis() as u64;
            let chunk = MediaChunk::new(payload(count, self.options.chunk_size), offset_ms);
            if let Some(tx) = self.sender.lock().as_ref() {
                let _ = tx.send(CaptureSignal::Data(chunk));
            }
        }

        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.active.store(false, Ordering::SeqCst);

        if let Some(handle) = self.capture_handle.take() {
            handle.abort();
        }
        self.sender.lock().take();

        self.counters.open.fetch_sub(1, Ordering::SeqCst);
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Synthetic capture released: {}", self.id);
    }

    fn is_active(&self) -> bool {
        !self.released
    }
}

impl Drop for SyntheticDevice {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(timeslice_ms: u64) -> CaptureConstraints {
        CaptureConstraints {
            timeslice_ms,
            ..CaptureConstraints::default()
        }
    }

    #[tokio::test]
    async fn test_denied_permission_opens_nothing() {
        let capture = SyntheticCapture::new(SyntheticOptions {
            permission: PermissionOutcome::Denied,
            ..SyntheticOptions::default()
        });

        let result = capture.acquire(&constraints(100)).await;

        assert!(matches!(result, Err(CaptureError::PermissionDenied(_))));
        assert_eq!(capture.acquisitions(), 0);
        assert_eq!(capture.open_devices(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_arrive_on_timeslice() {
        let capture = SyntheticCapture::new(SyntheticOptions {
            chunk_size: 8,
            max_chunks: Some(3),
            ..SyntheticOptions::default()
        });

        let mut acquired = capture.acquire(&constraints(100)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let mut received = Vec::new();
        while let Ok(signal) = acquired.chunks.try_recv() {
            received.push(signal);
        }

        assert_eq!(received.len(), 3);
        assert_eq!(
            received[0],
            CaptureSignal::Data(MediaChunk::new(vec![0; 8], 100))
        );
        acquired.device.release();
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_ends_stream_and_is_idempotent() {
        let capture = SyntheticCapture::default();
        let mut acquired = capture.acquire(&constraints(100)).await.unwrap();
        assert_eq!(capture.open_devices(), 1);

        acquired.device.release();
        acquired.device.release();

        assert_eq!(capture.open_devices(), 0);
        assert_eq!(capture.releases(), 1);
        assert!(!acquired.device.is_active());
        assert_eq!(acquired.chunks.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fault_is_pushed_into_stream() {
        let capture = SyntheticCapture::new(SyntheticOptions {
            fail_after: Some(1),
            ..SyntheticOptions::default()
        });
        let mut acquired = capture.acquire(&constraints(100)).await.unwrap();

        let first = acquired.chunks.recv().await.unwrap();
        let second = acquired.chunks.recv().await.unwrap();

        assert!(matches!(first, CaptureSignal::Data(_)));
        assert!(matches!(second, CaptureSignal::Failed(_)));
        acquired.device.release();
    }
}
