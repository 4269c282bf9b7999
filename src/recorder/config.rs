//! Recorder configuration

use crate::capture::CaptureConstraints;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for capture sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderConfig {
    /// File name reported to the upload flow
    pub artifact_name: String,

    /// MIME type used when the device does not report one
    pub mime_type: String,

    pub constraints: CaptureConstraints,

    /// How long `stop` waits for the chunk stream to drain
    pub drain_timeout_ms: u64,

    /// Key under which finished recordings are handed off
    pub handoff_key: String,

    /// How long an unclaimed handoff stays valid
    pub handoff_ttl_secs: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            artifact_name: "screen-recording.webm".to_string(),
            mime_type: "video/webm".to_string(),
            constraints: CaptureConstraints::default(),
            drain_timeout_ms: 2000,
            handoff_key: "recordedVideo".to_string(),
            handoff_ttl_secs: 600,
        }
    }
}

impl RecorderConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn handoff_ttl(&self) -> Duration {
        Duration::from_secs(self.handoff_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RecorderConfig =
            serde_json::from_str(r#"{ "artifactName": "demo.webm", "constraints": { "captureAudio": false } }"#)
                .unwrap();

        assert_eq!(config.artifact_name, "demo.webm");
        assert_eq!(config.mime_type, "video/webm");
        assert!(!config.constraints.capture_audio);
        assert_eq!(config.constraints.timeslice_ms, 1000);
        assert_eq!(config.handoff_key, "recordedVideo");
    }
}
