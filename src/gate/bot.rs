//! Bot and abuse decisions

use super::GateRequest;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Outcome of a bot/abuse check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum BotDecision {
    Allowed,
    Denied { reason: String },
}

/// Decides whether a request may reach the application at all
#[async_trait]
pub trait BotDetector: Send + Sync {
    async fn decide(&self, request: &GateRequest) -> BotDecision;
}

static DEFAULT_BOT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(UserAgentBotDetector::DEFAULT_PATTERN).expect("default bot pattern is valid")
});

/// Denies requests whose user agent looks like an automated client
pub struct UserAgentBotDetector {
    pattern: Regex,
}

impl UserAgentBotDetector {
    pub const DEFAULT_PATTERN: &'static str = r"(?i)bot|crawler|spider";

    pub fn new() -> Self {
        Self {
            pattern: DEFAULT_BOT_PATTERN.clone(),
        }
    }

    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Default for UserAgentBotDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BotDetector for UserAgentBotDetector {
    async fn decide(&self, request: &GateRequest) -> BotDecision {
        let user_agent = request.header("user-agent").unwrap_or_default();
        match self.pattern.find(user_agent) {
            Some(found) => BotDecision::Denied {
                reason: format!("automated user agent ({})", found.as_str()),
            },
            None => BotDecision::Allowed,
        }
    }
}
