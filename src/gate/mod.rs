//! Request gate
//!
//! Sits in front of the application: runs a bot/abuse decision, then a
//! session lookup, before letting a request through.

mod bot;
mod matcher;

pub use bot::{BotDecision, BotDetector, UserAgentBotDetector};
pub use matcher::{RouteMatcher, DEFAULT_EXCLUDED};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use url::Url;

/// Gate-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Session lookup failed: {0}")]
    SessionLookup(String),
}

/// The parts of an inbound request the gate looks at
#[derive(Debug, Clone, Default)]
pub struct GateRequest {
    pub url: String,
    pub path: String,
    /// Parsed request URL, absent when the request URL is relative
    absolute: Option<Url>,
    headers: HashMap<String, String>,
}

/// Stand-in base for resolving relative request URLs
static RELATIVE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://relative.invalid/").expect("base URL is valid"));

impl GateRequest {
    /// Accepts absolute URLs and origin-relative ones such as `/upload?x=1`.
    ///
    /// A URL that cannot be parsed is gated as `/`.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let (absolute, path) = match Url::parse(&url) {
            Ok(parsed) => {
                let path = parsed.path().to_string();
                (Some(parsed), path)
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                match Url::options().base_url(Some(&*RELATIVE_BASE)).parse(&url) {
                    Ok(resolved) => (None, resolved.path().to_string()),
                    Err(e) => {
                        tracing::warn!("Unparseable request URL {:?}: {}", url, e);
                        (None, "/".to_string())
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Unparseable request URL {:?}: {}", url, e);
                (None, "/".to_string())
            }
        };
        Self {
            url,
            path,
            absolute,
            headers: HashMap::new(),
        }
    }

    /// Add a header. Names are case-insensitive.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// `scheme://host[:port]` of the request URL, `None` for relative URLs
    pub fn origin(&self) -> Option<String> {
        self.absolute
            .as_ref()
            .map(|url| url.origin().ascii_serialization())
    }

    /// Resolve `location` against the request URL.
    ///
    /// Relative requests get `location` back unchanged.
    pub fn resolve(&self, location: &str) -> String {
        match self.absolute.as_ref().map(|url| url.join(location)) {
            Some(Ok(joined)) => joined.to_string(),
            Some(Err(e)) => {
                tracing::warn!("Cannot resolve {:?} against {}: {}", location, self.url, e);
                location.to_string()
            }
            None => location.to_string(),
        }
    }
}

/// An authenticated user session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub user_id: String,
}

/// Resolves the session attached to a request
#[async_trait]
pub trait SessionLookup: Send + Sync {
    async fn get_session(
        &self,
        headers: &HashMap<String, String>,
    ) -> Result<Option<UserSession>, GateError>;
}

/// What to do with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Path is not gated
    Bypass,
    /// Let the request through
    Forward { session: UserSession },
    /// Refuse with an HTTP status
    Reject { status: u16, reason: String },
    /// Send the client to `location`
    Redirect { location: String },
}

pub struct RequestGate {
    detector: Arc<dyn BotDetector>,
    sessions: Arc<dyn SessionLookup>,
    matcher: RouteMatcher,
    sign_in_path: String,
}

impl RequestGate {
    pub const FORBIDDEN: u16 = 403;

    pub fn new(detector: Arc<dyn BotDetector>, sessions: Arc<dyn SessionLookup>) -> Self {
        Self {
            detector,
            sessions,
            matcher: RouteMatcher::default(),
            sign_in_path: "/sign-in".to_string(),
        }
    }

    pub fn with_matcher(mut self, matcher: RouteMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }

    /// Run the bot decision, then the session lookup.
    ///
    /// A failed session lookup is treated like a missing session.
    pub async fn check(&self, request: &GateRequest) -> GateOutcome {
        if !self.matcher.matches(&request.path) {
            return GateOutcome::Bypass;
        }

        if let BotDecision::Denied { reason } = self.detector.decide(request).await {
            tracing::info!("Rejected {}: {}", request.path, reason);
            return GateOutcome::Reject {
                status: Self::FORBIDDEN,
                reason,
            };
        }

        let session = match self.sessions.get_session(request.headers()).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Session lookup for {} failed: {}", request.path, e);
                None
            }
        };

        match session {
            Some(session) => GateOutcome::Forward { session },
            None => {
                let location = request.resolve(&self.sign_in_path);
                tracing::debug!("No session for {}, redirecting to {}", request.path, location);
                GateOutcome::Redirect { location }
            }
        }
    }
}
