//! Capture session controller
//!
//! Owns one recording session from idle through recording and stopped, and
//! hands the finished artifact to the upload flow.
//!
//! ```text
//!   idle --start--> recording --stop--> stopped --handoff--> idle
//!    ^                  |                  |
//!    +------fail--------+                  |
//!    +---------------reset-----------------+
//! ```
//!
//! A device handle is held exactly while the session is recording. Every
//! path out of `recording` releases it.

use super::chunks::{ChunkCollector, CollectedChunks};
use super::config::RecorderConfig;
use super::error::{SessionError, SessionResult};
use super::state::{Artifact, ArtifactUrl, SessionSnapshot, SessionState, StopReport, StopWarning};
use super::timer::ElapsedTimer;
use super::urls::ObjectUrlRegistry;
use crate::capture::{CaptureCapability, CaptureError, DeviceHandle};
use crate::handoff::{HandoffStore, TransferRecord};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted during a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Device acquired, recording began
    Started { session_id: Uuid },
    /// Elapsed seconds while recording
    Tick(u64),
    /// Recording stopped and an artifact was assembled
    Stopped { size: u64 },
    /// The device reported a fault while recording
    CaptureFailed(String),
    /// Session aborted back to idle after a fault
    Failed(String),
    /// Session discarded
    Reset,
    /// Artifact ownership passed to the upload flow
    HandedOff { reference: ArtifactUrl },
}

pub struct CaptureSessionController {
    capability: Arc<dyn CaptureCapability>,
    urls: Arc<ObjectUrlRegistry>,
    config: RecorderConfig,

    state: SessionState,
    session_id: Uuid,

    /// Open only while recording
    handle: Option<DeviceHandle>,
    collector: Option<ChunkCollector>,
    timer: ElapsedTimer,
    mime_type: String,

    /// Present only while stopped
    artifact: Option<Artifact>,
    artifact_url: Option<ArtifactUrl>,

    event_tx: broadcast::Sender<SessionEvent>,
}

impl CaptureSessionController {
    pub fn new(
        capability: Arc<dyn CaptureCapability>,
        urls: Arc<ObjectUrlRegistry>,
        config: RecorderConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let mime_type = config.mime_type.clone();
        Self {
            capability,
            urls,
            config,
            state: SessionState::Idle,
            session_id: Uuid::new_v4(),
            handle: None,
            collector: None,
            timer: ElapsedTimer::new(),
            mime_type,
            artifact: None,
            artifact_url: None,
            event_tx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.seconds()
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn artifact_url(&self) -> Option<&ArtifactUrl> {
        self.artifact_url.as_ref()
    }

    /// Whether a device handle is currently held
    pub fn has_open_device(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_released())
    }

    /// Fault reported by the device during the current recording, if any
    pub fn capture_fault(&self) -> Option<String> {
        self.collector.as_ref().and_then(ChunkCollector::fault)
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            state: self.state,
            elapsed_seconds: self.timer.seconds(),
            artifact_url: self.artifact_url.clone(),
            artifact_size: self.artifact.as_ref().map(Artifact::size),
            mime_type: self.artifact.as_ref().map(|a| a.mime_type.clone()),
        }
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            operation,
            state: self.state,
        }
    }

    /// Acquire the capture device and begin recording.
    ///
    /// On denial the session stays idle and nothing is held. Dropping this
    /// future while the permission prompt is pending has the same effect.
    pub async fn start(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Idle || self.handle.is_some() {
            return Err(self.invalid("start"));
        }

        tracing::info!("Requesting screen capture");

        let acquired = match self.capability.acquire(&self.config.constraints).await {
            Ok(acquired) => acquired,
            Err(e) => {
                tracing::warn!("Screen capture not granted: {}", e);
                return Err(e.into());
            }
        };

        self.session_id = Uuid::new_v4();
        self.mime_type = if acquired.mime_type.is_empty() {
            self.config.mime_type.clone()
        } else {
            acquired.mime_type
        };
        self.collector = Some(ChunkCollector::spawn(acquired.chunks, self.event_tx.clone()));
        self.handle = Some(DeviceHandle::new(acquired.device));
        self.timer.start(self.event_tx.clone());
        self.state = SessionState::Recording;

        let _ = self.event_tx.send(SessionEvent::Started {
            session_id: self.session_id,
        });
        tracing::info!("Recording started (session {})", self.session_id);
        Ok(())
    }

    /// Stop recording and assemble the artifact.
    ///
    /// The device is released even if it fails to flush; whatever arrived
    /// before the failure becomes the artifact. Non-fatal conditions are
    /// listed in [`StopReport::warnings`].
    ///
    /// Dropping this future while the device flushes leaves the session
    /// recording. Once the device is released the stop always completes: a
    /// future dropped during the drain assembles what was buffered.
    pub async fn stop(&mut self) -> SessionResult<StopReport> {
        if self.state != SessionState::Recording {
            return Err(self.invalid("stop"));
        }

        tracing::info!("Stopping recording");

        let flushed = match self.handle.as_mut() {
            Some(handle) => handle.stop().await,
            None => Ok(()),
        };

        self.timer.stop();
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }

        let drain_timeout = self.config.drain_timeout();
        let mut pending = PendingStop {
            controller: self,
            flush_error: flushed.err(),
            completed: false,
        };
        let collected = match pending.controller.collector.as_mut() {
            Some(collector) => collector.finish(drain_timeout).await,
            None => CollectedChunks::default(),
        };
        Ok(pending.complete(collected))
    }

    fn complete_stop(
        &mut self,
        collected: CollectedChunks,
        flush_error: Option<CaptureError>,
    ) -> StopReport {
        self.collector = None;

        let mut warnings = Vec::new();
        if let Some(e) = flush_error {
            tracing::warn!("Device failed to flush: {}", e);
            warnings.push(StopWarning::FlushFailed(e.to_string()));
        }
        if let Some(fault) = collected.fault.clone() {
            warnings.push(StopWarning::CaptureFault(fault));
        }
        if collected.timed_out {
            warnings.push(StopWarning::DrainTimedOut);
        }

        let artifact = Artifact::new(collected.assemble(), self.mime_type.clone());
        if artifact.is_empty() {
            tracing::warn!("Recording produced no data");
            warnings.push(StopWarning::EmptyArtifact);
        }

        let url = self.urls.create(&artifact);
        let report = StopReport {
            artifact_url: url.clone(),
            size: artifact.size(),
            mime_type: artifact.mime_type.clone(),
            chunk_count: collected.chunks.len(),
            elapsed_seconds: self.timer.seconds(),
            warnings,
        };

        self.artifact = Some(artifact);
        self.artifact_url = Some(url);
        self.state = SessionState::Stopped;

        let _ = self.event_tx.send(SessionEvent::Stopped { size: report.size });
        tracing::info!(
            "Recording stopped: {} bytes in {} chunks over {}s",
            report.size,
            report.chunk_count,
            report.elapsed_seconds
        );
        report
    }

    /// Abort a recording after a device fault.
    ///
    /// Releases the device, drops buffered data and returns to idle.
    pub fn fail(&mut self, reason: impl Into<String>) -> SessionResult<()> {
        if self.state != SessionState::Recording {
            return Err(self.invalid("fail"));
        }

        let reason = reason.into();
        tracing::error!("Recording failed: {}", reason);

        self.release_recording_resources();
        self.state = SessionState::Idle;

        let _ = self.event_tx.send(SessionEvent::Failed(reason));
        Ok(())
    }

    /// Discard the session from any state. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.release_recording_resources();

        if let Some(url) = self.artifact_url.take() {
            self.urls.revoke(&url);
        }
        self.artifact = None;

        let previous = std::mem::replace(&mut self.state, SessionState::Idle);
        if previous != SessionState::Idle {
            tracing::info!("Session reset from {}", previous);
            let _ = self.event_tx.send(SessionEvent::Reset);
        }
    }

    /// Pass the artifact to the upload flow through `store`.
    ///
    /// The artifact reference stays live: the upload flow owns it from here
    /// and is responsible for revoking it.
    pub fn handoff(&mut self, store: &HandoffStore) -> SessionResult<TransferRecord> {
        if self.state != SessionState::Stopped {
            return Err(self.invalid("handoff"));
        }
        let (artifact, url) = match (self.artifact.as_ref(), self.artifact_url.as_ref()) {
            (Some(artifact), Some(url)) => (artifact, url),
            _ => return Err(self.invalid("handoff")),
        };

        let record = TransferRecord {
            reference: url.clone(),
            name: self.config.artifact_name.clone(),
            mime_type: artifact.mime_type.clone(),
            size: artifact.size(),
            elapsed_seconds: self.timer.seconds(),
        };
        store.put(&self.config.handoff_key, record.clone())?;

        self.artifact = None;
        self.artifact_url = None;
        self.timer.reset();
        self.state = SessionState::Idle;

        let _ = self.event_tx.send(SessionEvent::HandedOff {
            reference: record.reference.clone(),
        });
        tracing::info!(
            "Handed off {} ({} bytes, {}s)",
            record.name,
            record.size,
            record.elapsed_seconds
        );
        Ok(record)
    }

    /// Discard the current session and start a new one
    pub async fn record_again(&mut self) -> SessionResult<()> {
        self.reset();
        self.start().await
    }

    fn release_recording_resources(&mut self) {
        self.timer.reset();
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
        if let Some(collector) = self.collector.take() {
            collector.discard();
        }
    }
}

/// The part of `stop` that runs after the device is released.
///
/// The session can no longer be recording at this point, so if the stop
/// future is dropped mid-drain the guard finishes the stop with whatever the
/// collector buffered.
struct PendingStop<'a> {
    controller: &'a mut CaptureSessionController,
    flush_error: Option<CaptureError>,
    completed: bool,
}

impl PendingStop<'_> {
    fn complete(&mut self, collected: CollectedChunks) -> StopReport {
        self.completed = true;
        self.controller.complete_stop(collected, self.flush_error.take())
    }
}

impl Drop for PendingStop<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        tracing::warn!("Stop interrupted while draining, keeping buffered chunks");
        let collected = match self.controller.collector.as_mut() {
            Some(collector) => collector.abandon(),
            None => CollectedChunks::default(),
        };
        self.complete(collected);
    }
}

impl Drop for CaptureSessionController {
    fn drop(&mut self) {
        self.reset();
    }
}
