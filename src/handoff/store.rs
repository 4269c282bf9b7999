//! Short-lived keyed store between the recorder and the upload flow

use super::{HandoffError, TransferRecord};
use crate::recorder::ObjectUrlRegistry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

struct Entry {
    record: TransferRecord,
    stored_at: Instant,
}

/// Process-wide handoff channel.
///
/// Records that nobody takes within the TTL are dropped and their artifact
/// reference is revoked. A taken record belongs to the consumer, which must
/// revoke the reference once it is done with it.
pub struct HandoffStore {
    urls: Arc<ObjectUrlRegistry>,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl HandoffStore {
    pub fn new(urls: Arc<ObjectUrlRegistry>, ttl: Duration) -> Self {
        Self {
            urls,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a record under `key`, replacing any unclaimed one
    pub fn put(&self, key: &str, record: TransferRecord) -> Result<(), HandoffError> {
        if self.urls.resolve(&record.reference).is_none() {
            return Err(HandoffError::DanglingReference(record.reference.to_string()));
        }

        let previous = self.entries.lock().insert(
            key.to_string(),
            Entry {
                record,
                stored_at: Instant::now(),
            },
        );

        if let Some(previous) = previous {
            tracing::warn!("Replacing unclaimed handoff under '{}'", key);
            self.urls.revoke(&previous.record.reference);
        }

        tracing::debug!("Handoff stored under '{}'", key);
        Ok(())
    }

    /// Remove and return the record under `key`, unless it expired
    pub fn take(&self, key: &str) -> Option<TransferRecord> {
        let entry = self.entries.lock().remove(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            tracing::warn!("Handoff under '{}' expired before it was taken", key);
            self.urls.revoke(&entry.record.reference);
            return None;
        }
        Some(entry.record)
    }

    pub fn peek(&self, key: &str) -> Option<TransferRecord> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.record.clone())
    }

    /// Drop expired records and revoke their references
    pub fn purge_expired(&self) -> usize {
        let expired: Vec<TransferRecord> = {
            let mut entries = self.entries.lock();
            let keys: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| entry.stored_at.elapsed() >= self.ttl)
                .map(|(key, _)| key.clone())
                .collect();
            keys.iter()
                .filter_map(|key| entries.remove(key))
                .map(|entry| entry.record)
                .collect()
        };

        for record in &expired {
            self.urls.revoke(&record.reference);
        }
        if !expired.is_empty() {
            tracing::info!("Purged {} unclaimed handoffs", expired.len());
        }
        expired.len()
    }

    /// Purge expired records periodically until the task is aborted
    pub fn spawn_purger(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.purge_expired();
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::Artifact;

    fn record_for(urls: &ObjectUrlRegistry) -> TransferRecord {
        let artifact = Artifact::new(vec![1; 32], "video/webm");
        TransferRecord {
            reference: urls.create(&artifact),
            name: "screen-recording.webm".to_string(),
            mime_type: artifact.mime_type.clone(),
            size: artifact.size(),
            elapsed_seconds: 4,
        }
    }

    #[tokio::test]
    async fn test_take_hands_over_once() {
        let urls = Arc::new(ObjectUrlRegistry::new());
        let store = HandoffStore::new(urls.clone(), Duration::from_secs(60));
        let record = record_for(&urls);

        store.put("recordedVideo", record.clone()).unwrap();

        assert_eq!(store.peek("recordedVideo"), Some(record.clone()));
        assert_eq!(store.take("recordedVideo"), Some(record.clone()));
        assert_eq!(store.take("recordedVideo"), None);
        assert!(urls.resolve(&record.reference).is_some());
    }

    #[tokio::test]
    async fn test_put_rejects_revoked_reference() {
        let urls = Arc::new(ObjectUrlRegistry::new());
        let store = HandoffStore::new(urls.clone(), Duration::from_secs(60));
        let record = record_for(&urls);
        urls.revoke(&record.reference);

        let result = store.put("recordedVideo", record);

        assert!(matches!(result, Err(HandoffError::DanglingReference(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_replacing_revokes_unclaimed_record() {
        let urls = Arc::new(ObjectUrlRegistry::new());
        let store = HandoffStore::new(urls.clone(), Duration::from_secs(60));
        let first = record_for(&urls);
        let second = record_for(&urls);

        store.put("recordedVideo", first.clone()).unwrap();
        store.put("recordedVideo", second.clone()).unwrap();

        assert!(urls.resolve(&first.reference).is_none());
        assert_eq!(store.take("recordedVideo"), Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_records_are_purged_and_revoked() {
        let urls = Arc::new(ObjectUrlRegistry::new());
        let store = HandoffStore::new(urls.clone(), Duration::from_secs(10));
        let record = record_for(&urls);
        store.put("recordedVideo", record.clone()).unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(store.peek("recordedVideo"), None);
        assert_eq!(store.purge_expired(), 1);
        assert!(urls.resolve(&record.reference).is_none());
        assert_eq!(store.take("recordedVideo"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purger_runs_in_background() {
        let urls = Arc::new(ObjectUrlRegistry::new());
        let store = Arc::new(HandoffStore::new(urls.clone(), Duration::from_secs(5)));
        let record = record_for(&urls);
        store.put("recordedVideo", record.clone()).unwrap();

        let purger = store.spawn_purger(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(6500)).await;

        assert!(store.is_empty());
        assert!(urls.resolve(&record.reference).is_none());
        purger.abort();
    }
}
