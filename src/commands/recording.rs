//! Recording commands for the record dialog

use super::dialog::DialogView;
use crate::handoff::{HandoffStore, TransferRecord};
use crate::recorder::{CaptureSessionController, SessionSnapshot, StopReport};
use crate::utils::error::ErrorResponse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state for recording
pub struct RecorderState {
    pub controller: Arc<Mutex<CaptureSessionController>>,
    pub handoff: Arc<HandoffStore>,
    dialog_open: AtomicBool,
}

impl RecorderState {
    pub fn new(controller: CaptureSessionController, handoff: Arc<HandoffStore>) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            handoff,
            dialog_open: AtomicBool::new(false),
        }
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open.load(Ordering::SeqCst)
    }
}

fn view_of(state: &RecorderState, controller: &CaptureSessionController) -> DialogView {
    if state.is_dialog_open() {
        DialogView::for_session(&controller.snapshot())
    } else {
        DialogView::closed()
    }
}

/// Open the record dialog
pub async fn open_dialog(state: &RecorderState) -> Result<DialogView, ErrorResponse> {
    state.dialog_open.store(true, Ordering::SeqCst);
    let controller = state.controller.lock().await;
    Ok(view_of(state, &controller))
}

/// Close the dialog, discarding whatever was recorded
pub async fn close_dialog(state: &RecorderState) -> Result<DialogView, ErrorResponse> {
    let mut controller = state.controller.lock().await;
    controller.reset();
    state.dialog_open.store(false, Ordering::SeqCst);
    Ok(DialogView::closed())
}

/// Start recording
pub async fn start_recording(state: &RecorderState) -> Result<DialogView, ErrorResponse> {
    let mut controller = state.controller.lock().await;
    if let Err(e) = controller.start().await {
        tracing::error!("Failed to start recording: {}", e);
        return Err(e.into());
    }
    Ok(view_of(state, &controller))
}

/// Stop recording
pub async fn stop_recording(state: &RecorderState) -> Result<StopReport, ErrorResponse> {
    let mut controller = state.controller.lock().await;
    controller.stop().await.map_err(|e| {
        tracing::error!("Failed to stop recording: {}", e);
        ErrorResponse::from(e)
    })
}

/// Discard the current recording and start over
pub async fn record_again(state: &RecorderState) -> Result<DialogView, ErrorResponse> {
    let mut controller = state.controller.lock().await;
    if let Err(e) = controller.record_again().await {
        tracing::error!("Failed to record again: {}", e);
        return Err(e.into());
    }
    Ok(view_of(state, &controller))
}

/// Hand the recording to the upload flow and close the dialog
pub async fn go_to_upload(state: &RecorderState) -> Result<TransferRecord, ErrorResponse> {
    let mut controller = state.controller.lock().await;
    let record = controller.handoff(&state.handoff).map_err(|e| {
        tracing::error!("No recording available for upload: {}", e);
        ErrorResponse::from(e)
    })?;
    state.dialog_open.store(false, Ordering::SeqCst);
    Ok(record)
}

/// Get the current dialog view
pub async fn get_dialog_view(state: &RecorderState) -> Result<DialogView, ErrorResponse> {
    let controller = state.controller.lock().await;
    Ok(view_of(state, &controller))
}

/// Get the current session snapshot
pub async fn get_session_snapshot(state: &RecorderState) -> Result<SessionSnapshot, ErrorResponse> {
    let controller = state.controller.lock().await;
    Ok(controller.snapshot())
}
