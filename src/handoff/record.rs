//! Transfer record handed to the upload flow

use super::HandoffError;
use crate::recorder::ArtifactUrl;
use serde::{Deserialize, Serialize};

/// A finished recording as seen by the upload flow.
///
/// Serializes with the keys the upload page reads: `url`, `name`, `type`,
/// `size` and `duration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    #[serde(rename = "url")]
    pub reference: ArtifactUrl,

    pub name: String,

    #[serde(rename = "type")]
    pub mime_type: String,

    pub size: u64,

    #[serde(rename = "duration")]
    pub elapsed_seconds: u64,
}

impl TransferRecord {
    pub fn to_json(&self) -> Result<String, HandoffError> {
        serde_json::to_string(self).map_err(|e| HandoffError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, HandoffError> {
        serde_json::from_str(json).map_err(|e| HandoffError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_keys() {
        let record = TransferRecord {
            reference: ArtifactUrl::parse("blob:snapcast/6f1c2a4e-0c1d-4b3e-9a57-8a3b2c1d0e9f")
                .unwrap(),
            name: "screen-recording.webm".to_string(),
            mime_type: "video/webm".to_string(),
            size: 2048,
            elapsed_seconds: 12,
        };

        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();

        assert_eq!(value["url"], "blob:snapcast/6f1c2a4e-0c1d-4b3e-9a57-8a3b2c1d0e9f");
        assert_eq!(value["type"], "video/webm");
        assert_eq!(value["size"], 2048);
        assert_eq!(value["duration"], 12);
        assert_eq!(TransferRecord::from_json(&record.to_json().unwrap()).unwrap(), record);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let error = TransferRecord::from_json("{\"url\": 3}").unwrap_err();
        assert!(matches!(error, HandoffError::Serialization(_)));
    }
}
