//! Host application context
//!
//! Everything with process lifetime is built once in [`AppContext::startup`]
//! and torn down in [`AppContext::shutdown`].

use crate::capture::CaptureCapability;
use crate::commands::recording::RecorderState;
use crate::db::{DatabaseClient, DatabaseConfig};
use crate::handoff::HandoffStore;
use crate::recorder::{CaptureSessionController, ObjectUrlRegistry, RecorderConfig};
use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often unclaimed handoffs are swept
const PURGE_INTERVAL: Duration = Duration::from_secs(30);

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub recorder: RecorderConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load a JSON config file. The database API key comes from the environment.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&content)?;
        config.database = config.database.with_env(|name| std::env::var(name).ok());
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        let recorder = &self.recorder;
        if recorder.artifact_name.trim().is_empty() {
            return Err(AppError::Config("artifactName must not be empty".to_string()));
        }
        if recorder.handoff_key.trim().is_empty() {
            return Err(AppError::Config("handoffKey must not be empty".to_string()));
        }
        if recorder.constraints.timeslice_ms == 0 {
            return Err(AppError::Config("timesliceMs must be positive".to_string()));
        }
        if recorder.handoff_ttl_secs == 0 {
            return Err(AppError::Config("handoffTtlSecs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Process-wide services shared by every request and recording
pub struct AppContext {
    config: AppConfig,
    db: Arc<DatabaseClient>,
    urls: Arc<ObjectUrlRegistry>,
    handoff: Arc<HandoffStore>,
    purger: Option<JoinHandle<()>>,
}

impl AppContext {
    /// Build the process-wide services. Must run inside a tokio runtime.
    pub fn startup(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let db = Arc::new(DatabaseClient::connect(config.database.clone())?);
        let urls = Arc::new(ObjectUrlRegistry::new());
        let handoff = Arc::new(HandoffStore::new(urls.clone(), config.recorder.handoff_ttl()));
        let purger = handoff.spawn_purger(PURGE_INTERVAL);

        tracing::info!("Application context started");
        Ok(Self {
            config,
            db,
            urls,
            handoff,
            purger: Some(purger),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn db(&self) -> &Arc<DatabaseClient> {
        &self.db
    }

    pub fn urls(&self) -> &Arc<ObjectUrlRegistry> {
        &self.urls
    }

    pub fn handoff(&self) -> &Arc<HandoffStore> {
        &self.handoff
    }

    /// New session controller over `capability`
    pub fn session_controller(&self, capability: Arc<dyn CaptureCapability>) -> CaptureSessionController {
        CaptureSessionController::new(capability, self.urls.clone(), self.config.recorder.clone())
    }

    /// Recorder state for the presentation layer
    pub fn recorder_state(&self, capability: Arc<dyn CaptureCapability>) -> RecorderState {
        RecorderState::new(self.session_controller(capability), self.handoff.clone())
    }

    /// Stop background work, drop unclaimed handoffs and close the database
    pub fn shutdown(mut self) {
        if let Some(purger) = self.purger.take() {
            purger.abort();
        }
        self.handoff.purge_expired();
        self.db.close();
        tracing::info!("Application context shut down");
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        if let Some(purger) = self.purger.take() {
            purger.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SyntheticCapture;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_with_key() -> AppConfig {
        AppConfig {
            database: DatabaseConfig::default().with_env(|_| Some("xau_test".to_string())),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_from_file_reads_partial_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "recorder": {{ "artifactName": "demo.webm", "handoffTtlSecs": 60 }}, "database": {{ "branch": "dev" }} }}"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.recorder.artifact_name, "demo.webm");
        assert_eq!(config.recorder.handoff_ttl_secs, 60);
        assert_eq!(config.database.branch, "dev");
        assert_eq!(config.database.database_url, crate::db::DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = AppConfig::from_json_str(r#"{ "recorder": { "constraints": { "timesliceMs": 0 } } }"#);
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = AppConfig::from_json_str(r#"{ "recorder": { "artifactName": " " } }"#);
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = AppConfig::from_json_str("not json");
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file(Path::new("/nonexistent/snapcast.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn test_startup_requires_api_key() {
        let result = AppContext::startup(AppConfig {
            database: DatabaseConfig::default().with_env(|_| None),
            ..AppConfig::default()
        });
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_database_and_drops_handoffs() {
        let context = AppContext::startup(config_with_key()).unwrap();
        let db = context.db().clone();
        let urls = context.urls().clone();

        let mut controller = context.session_controller(Arc::new(SyntheticCapture::default()));
        controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        controller.stop().await.unwrap();
        let record = controller.handoff(context.handoff()).unwrap();
        assert!(urls.resolve(&record.reference).is_some());

        tokio::time::advance(context.config().recorder.handoff_ttl()).await;
        context.shutdown();

        assert!(db.is_closed());
        assert!(urls.resolve(&record.reference).is_none());
    }
}
