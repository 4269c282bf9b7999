//! Record dialog view model
//!
//! What the record dialog shows for a given session snapshot.

use crate::recorder::{ArtifactUrl, SessionSnapshot, SessionState};
use crate::utils::format_duration;
use serde::{Deserialize, Serialize};

pub const PROMPT_MESSAGE: &str = "Click record to start capturing your screen";

/// Main panel of the dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DialogPanel {
    Prompt { message: String },
    Recording { label: String },
    Preview { url: ArtifactUrl },
}

/// Buttons the dialog offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogAction {
    /// "Record a video", shown while the dialog is closed
    Open,
    Record,
    Stop,
    RecordAgain,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogView {
    pub open: bool,
    pub panel: DialogPanel,
    pub actions: Vec<DialogAction>,
}

impl DialogView {
    pub fn closed() -> Self {
        Self {
            open: false,
            panel: DialogPanel::Prompt {
                message: PROMPT_MESSAGE.to_string(),
            },
            actions: vec![DialogAction::Open],
        }
    }

    pub fn for_session(snapshot: &SessionSnapshot) -> Self {
        let (panel, actions) = match (snapshot.state, &snapshot.artifact_url) {
            (SessionState::Recording, _) => (
                DialogPanel::Recording {
                    label: format!(
                        "Recording in progress... {}",
                        format_duration(snapshot.elapsed_seconds)
                    ),
                },
                vec![DialogAction::Stop],
            ),
            (SessionState::Stopped, Some(url)) => (
                DialogPanel::Preview { url: url.clone() },
                vec![DialogAction::RecordAgain, DialogAction::Upload],
            ),
            _ => (
                DialogPanel::Prompt {
                    message: PROMPT_MESSAGE.to_string(),
                },
                vec![DialogAction::Record],
            ),
        };

        Self {
            open: true,
            panel,
            actions,
        }
    }

    pub fn allows(&self, action: DialogAction) -> bool {
        self.actions.contains(&action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn snapshot(state: SessionState, elapsed_seconds: u64, url: Option<ArtifactUrl>) -> SessionSnapshot {
        SessionSnapshot {
            session_id: Uuid::new_v4(),
            state,
            elapsed_seconds,
            artifact_size: url.as_ref().map(|_| 10),
            mime_type: url.as_ref().map(|_| "video/webm".to_string()),
            artifact_url: url,
        }
    }

    #[test]
    fn test_idle_shows_prompt_and_record() {
        let view = DialogView::for_session(&snapshot(SessionState::Idle, 0, None));

        assert!(view.open);
        assert_eq!(view.actions, vec![DialogAction::Record]);
        assert!(matches!(view.panel, DialogPanel::Prompt { .. }));
    }

    #[test]
    fn test_recording_shows_timer_and_stop() {
        let view = DialogView::for_session(&snapshot(SessionState::Recording, 75, None));

        assert_eq!(
            view.panel,
            DialogPanel::Recording {
                label: "Recording in progress... 01:15".to_string()
            }
        );
        assert!(view.allows(DialogAction::Stop));
        assert!(!view.allows(DialogAction::Upload));
    }

    #[test]
    fn test_stopped_shows_preview() {
        let url = ArtifactUrl::parse("blob:snapcast/0d9b2f7e-5b86-4a4e-8c55-3f0f5f0e2a11").unwrap();
        let view = DialogView::for_session(&snapshot(SessionState::Stopped, 3, Some(url.clone())));

        assert_eq!(view.panel, DialogPanel::Preview { url });
        assert_eq!(view.actions, vec![DialogAction::RecordAgain, DialogAction::Upload]);
    }

    #[test]
    fn test_closed_view_serializes() {
        let json = serde_json::to_value(DialogView::closed()).unwrap();

        assert_eq!(json["open"], false);
        assert_eq!(json["panel"]["kind"], "prompt");
        assert_eq!(json["actions"][0], "open");
    }
}
