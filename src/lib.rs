//! Snapcast - screen recording capture and upload handoff.
//!
//! This is the main library crate. It provides the capture session state
//! machine, the handoff to the upload flow, the request gate and the host
//! context that ties them together.

pub mod app;
pub mod capture;
pub mod commands;
pub mod db;
pub mod gate;
pub mod handoff;
pub mod recorder;
pub mod utils;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use app::{AppConfig, AppContext};
use capture::{SyntheticCapture, SyntheticOptions};
use handoff::{HandoffStore, TransferRecord};
use recorder::CaptureSessionController;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utils::error::AppResult;

/// Initialize tracing/logging
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapcast=debug,snapcast_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Record for `duration` with the synthetic capability and hand the result off.
///
/// Loads `config_path` if given, otherwise uses defaults with the API key
/// from the environment.
pub async fn run(config_path: Option<&Path>, duration: Duration) -> AppResult<TransferRecord> {
    tracing::info!("Starting Snapcast v{}", env!("CARGO_PKG_VERSION"));

    let config = match config_path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig {
            database: db::DatabaseConfig::from_env(),
            ..AppConfig::default()
        },
    };
    let context = AppContext::startup(config)?;

    let capability = Arc::new(SyntheticCapture::new(SyntheticOptions {
        mime_type: context.config().recorder.mime_type.clone(),
        ..SyntheticOptions::default()
    }));
    let mut controller = context.session_controller(capability);

    let outcome = record_once(&mut controller, context.handoff(), duration).await;

    drop(controller);
    context.shutdown();
    outcome
}

async fn record_once(
    controller: &mut CaptureSessionController,
    store: &HandoffStore,
    duration: Duration,
) -> AppResult<TransferRecord> {
    controller.start().await?;
    tokio::time::sleep(duration).await;

    let report = controller.stop().await?;
    for warning in &report.warnings {
        tracing::warn!("Recording finished with warning: {:?}", warning);
    }

    Ok(controller.handoff(store)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test(start_paused = true)]
    async fn test_run_rejects_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "recorder": {{ "handoffKey": "" }} }}"#).unwrap();

        let result = run(Some(file.path()), Duration::from_secs(1)).await;

        assert!(matches!(result, Err(utils::AppError::Config(_))));
    }
}
