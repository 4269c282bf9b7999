//! Database client
//!
//! One long-lived client per process, constructed by the host at startup and
//! closed at shutdown. The schema lives with the database, not here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use url::Url;

pub const DEFAULT_DATABASE_URL: &str =
    "https://WhoamiI00-s-workspace-1erblk.us-east-1.xata.sh/db/snapcast";
pub const API_KEY_VAR: &str = "XATA_API_KEY";

/// Database-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    #[error("Database client is closed")]
    Closed,
}

/// Connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseConfig {
    pub database_url: String,

    pub branch: String,

    /// Never read from config files
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            branch: "main".to_string(),
            api_key: None,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("database_url", &self.database_url)
            .field("branch", &self.branch)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl DatabaseConfig {
    /// Defaults plus the API key from the process environment
    pub fn from_env() -> Self {
        Self::default().with_env(|name| std::env::var(name).ok())
    }

    /// Fill in the API key using `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key = lookup(API_KEY_VAR).filter(|key| !key.trim().is_empty());
        self
    }
}

/// Handle to the application database
pub struct DatabaseClient {
    config: DatabaseConfig,
    api_key: String,
    closed: AtomicBool,
}

impl DatabaseClient {
    pub fn connect(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        match Url::parse(&config.database_url) {
            Ok(url) if matches!(url.scheme(), "https" | "http") && url.has_host() => {}
            _ => return Err(DatabaseError::InvalidUrl(config.database_url)),
        }
        let api_key = config
            .api_key
            .clone()
            .ok_or(DatabaseError::MissingApiKey(API_KEY_VAR))?;

        tracing::info!(
            "Database client ready for {} (branch {})",
            config.database_url,
            config.branch
        );
        Ok(Self {
            config,
            api_key,
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Endpoint for the configured branch, `<database_url>:<branch>`
    pub fn branch_url(&self) -> Result<String, DatabaseError> {
        self.ensure_open()?;
        Ok(format!("{}:{}", self.config.database_url, self.config.branch))
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> Result<String, DatabaseError> {
        self.ensure_open()?;
        Ok(format!("Bearer {}", self.api_key))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!("Database client closed");
        }
    }

    fn ensure_open(&self) -> Result<(), DatabaseError> {
        if self.is_closed() {
            return Err(DatabaseError::Closed);
        }
        Ok(())
    }
}

impl fmt::Debug for DatabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseClient")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_key(name: &str) -> Option<String> {
        (name == API_KEY_VAR).then(|| "xau_test_key".to_string())
    }

    #[test]
    fn test_connect_requires_api_key() {
        let result = DatabaseClient::connect(DatabaseConfig::default().with_env(|_| None));
        assert_eq!(result.unwrap_err(), DatabaseError::MissingApiKey(API_KEY_VAR));

        let blank = DatabaseConfig::default().with_env(|_| Some("  ".to_string()));
        assert!(DatabaseClient::connect(blank).is_err());
    }

    #[test]
    fn test_branch_url_and_auth() {
        let client = DatabaseClient::connect(DatabaseConfig::default().with_env(env_with_key)).unwrap();

        assert_eq!(
            client.branch_url().unwrap(),
            "https://WhoamiI00-s-workspace-1erblk.us-east-1.xata.sh/db/snapcast:main"
        );
        assert_eq!(client.authorization().unwrap(), "Bearer xau_test_key");
    }

    #[test]
    fn test_closed_client_refuses_work() {
        let client = DatabaseClient::connect(DatabaseConfig::default().with_env(env_with_key)).unwrap();

        client.close();
        client.close();

        assert!(client.is_closed());
        assert_eq!(client.branch_url(), Err(DatabaseError::Closed));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = DatabaseConfig::default().with_env(env_with_key);
        let printed = format!("{:?}", config);

        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("xau_test_key"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        for database_url in [
            "snapcast",
            "ftp://files.example/db/snapcast",
            "https://",
            "mailto:db@snapcast.app",
        ] {
            let config = DatabaseConfig {
                database_url: database_url.to_string(),
                ..DatabaseConfig::default().with_env(env_with_key)
            };
            assert!(
                matches!(DatabaseClient::connect(config), Err(DatabaseError::InvalidUrl(_))),
                "{} should be rejected",
                database_url
            );
        }
    }
}
