//! Object URL registry
//!
//! Process-wide table of locally resolvable artifact references. A reference
//! stays resolvable until it is revoked; a revoked reference never resolves
//! again.

use super::state::{Artifact, ArtifactUrl};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: RwLock<HashMap<ArtifactUrl, Artifact>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact and return a fresh reference to it
    pub fn create(&self, artifact: &Artifact) -> ArtifactUrl {
        let url = ArtifactUrl::generate();
        self.entries.write().insert(url.clone(), artifact.clone());
        tracing::debug!("Created {} for {} bytes", url, artifact.size());
        url
    }

    pub fn resolve(&self, url: &ArtifactUrl) -> Option<Artifact> {
        self.entries.read().get(url).cloned()
    }

    /// Revoke a reference. Returns false if it was not live.
    pub fn revoke(&self, url: &ArtifactUrl) -> bool {
        let removed = self.entries.write().remove(url).is_some();
        if removed {
            tracing::debug!("Revoked {}", url);
        }
        removed
    }

    /// Number of live references
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
