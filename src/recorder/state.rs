//! Recording session state
//!
//! Defines the session state machine, the artifact a finished session
//! produces, and the views handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Current state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing captured, no device held
    Idle,
    /// Device held, chunks accumulating
    Recording,
    /// Device released, artifact ready for review
    Stopped,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Finished media produced by one session.
///
/// Immutable; clones share the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: Uuid,
    pub data: Arc<[u8]>,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            data: data.into(),
            mime_type: mime_type.into(),
            created_at: Utc::now(),
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Locally resolvable reference to an artifact (`blob:snapcast/<uuid>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactUrl(String);

impl ArtifactUrl {
    pub const SCHEME: &'static str = "blob:snapcast/";

    pub(crate) fn generate() -> Self {
        Self(format!("{}{}", Self::SCHEME, Uuid::new_v4()))
    }

    /// Wrap an existing reference string, e.g. one read back from a transfer record
    pub fn parse(value: &str) -> Option<Self> {
        value
            .strip_prefix(Self::SCHEME)
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(|_| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-fatal conditions reported when a session stops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum StopWarning {
    /// Recording produced no data
    EmptyArtifact,
    /// The device failed to flush; the artifact holds what arrived before
    FlushFailed(String),
    /// The device reported a fault while recording
    CaptureFault(String),
    /// Buffered chunks were not fully drained in time
    DrainTimedOut,
}

/// Outcome of a completed `stop`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopReport {
    pub artifact_url: ArtifactUrl,
    pub size: u64,
    pub mime_type: String,
    pub chunk_count: usize,
    pub elapsed_seconds: u64,
    pub warnings: Vec<StopWarning>,
}

impl StopReport {
    pub fn is_empty(&self) -> bool {
        self.warnings.contains(&StopWarning::EmptyArtifact)
    }
}

/// Serializable view of a session for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionState,
    pub elapsed_seconds: u64,
    pub artifact_url: Option<ArtifactUrl>,
    pub artifact_size: Option<u64>,
    pub mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&SessionState::Recording).unwrap();
        assert_eq!(json, "\"recording\"");
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn test_artifact_url_parse() {
        let url = ArtifactUrl::generate();
        assert_eq!(ArtifactUrl::parse(url.as_str()), Some(url.clone()));
        assert!(url.as_str().starts_with("blob:snapcast/"));

        assert_eq!(ArtifactUrl::parse("blob:snapcast/not-a-uuid"), None);
        assert_eq!(ArtifactUrl::parse("https://example.com/video.webm"), None);
    }

    #[test]
    fn test_artifact_clone_shares_payload() {
        let artifact = Artifact::new(vec![1, 2, 3], "video/webm");
        let copy = artifact.clone();

        assert_eq!(artifact.size(), 3);
        assert!(Arc::ptr_eq(&artifact.data, &copy.data));
    }
}
