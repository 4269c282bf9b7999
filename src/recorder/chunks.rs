//! Chunk accumulation
//!
//! Drains a device's chunk stream into session-private storage while the
//! session is recording.

use super::controller::SessionEvent;
use crate::capture::{CaptureSignal, MediaChunk};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Everything a collector gathered before it was finished
#[derive(Debug, Default)]
pub struct CollectedChunks {
    pub chunks: Vec<MediaChunk>,
    pub fault: Option<String>,
    pub timed_out: bool,
}

impl CollectedChunks {
    /// Concatenate chunks in arrival order
    pub fn assemble(&self) -> Vec<u8> {
        let total = self.chunks.iter().map(MediaChunk::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in &self.chunks {
            data.extend_from_slice(&chunk.data);
        }
        data
    }
}

pub struct ChunkCollector {
    buffer: Arc<Mutex<Vec<MediaChunk>>>,
    fault: Arc<Mutex<Option<String>>>,
    task: Option<JoinHandle<()>>,
}

impl ChunkCollector {
    /// Start draining `chunks` in the background
    pub fn spawn(
        mut chunks: mpsc::UnboundedReceiver<CaptureSignal>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let fault = Arc::new(Mutex::new(None));

        let task = {
            let buffer = buffer.clone();
            let fault = fault.clone();
            tokio::spawn(async move {
                while let Some(signal) = chunks.recv().await {
                    match signal {
                        CaptureSignal::Data(chunk) => {
                            tracing::trace!(
                                "Chunk at {}ms ({} bytes)",
                                chunk.offset_ms,
                                chunk.len()
                            );
                            buffer.lock().push(chunk);
                        }
                        CaptureSignal::Failed(reason) => {
                            tracing::error!("Capture fault: {}", reason);
                            *fault.lock() = Some(reason.clone());
                            let _ = events.send(SessionEvent::CaptureFailed(reason));
                            break;
                        }
                    }
                }
            })
        };

        Self {
            buffer,
            fault,
            task: Some(task),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn fault(&self) -> Option<String> {
        self.fault.lock().clone()
    }

    /// Wait for the stream to end, then hand over what was collected.
    ///
    /// The stream ends once the device is released. If draining takes longer
    /// than `timeout` the collector is aborted and keeps what it had. If this
    /// future is dropped the buffer is untouched and `finish` can be called
    /// again.
    pub async fn finish(&mut self, timeout: Duration) -> CollectedChunks {
        let mut timed_out = false;
        if let Some(task) = self.task.as_mut() {
            if tokio::time::timeout(timeout, &mut *task).await.is_err() {
                tracing::warn!("Chunk stream not drained after {:?}, aborting", timeout);
                task.abort();
                timed_out = true;
            }
            self.task = None;
        }

        self.take_collected(timed_out)
    }

    /// Stop draining now and hand over whatever has arrived so far
    pub fn abandon(&mut self) -> CollectedChunks {
        let cut_short = match self.task.take() {
            Some(task) => {
                let finished = task.is_finished();
                task.abort();
                !finished
            }
            None => false,
        };
        self.take_collected(cut_short)
    }

    fn take_collected(&self, timed_out: bool) -> CollectedChunks {
        CollectedChunks {
            chunks: std::mem::take(&mut *self.buffer.lock()),
            fault: self.fault.lock().take(),
            timed_out,
        }
    }

    /// Stop collecting and drop everything gathered
    pub fn discard(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let dropped = std::mem::take(&mut *self.buffer.lock()).len();
        if dropped > 0 {
            tracing::debug!("Discarded {} buffered chunks", dropped);
        }
    }
}

impl Drop for ChunkCollector {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
