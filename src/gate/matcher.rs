//! Route matching for the request gate

use regex::Regex;
use std::sync::LazyLock;

/// Path prefixes that never go through the gate
pub const DEFAULT_EXCLUDED: &[&str] = &[
    "api",
    "_next/static",
    "_next/image",
    "favicon.ico",
    "sign-in",
    "assets",
];

/// Decides which paths the gate applies to.
///
/// A path is gated unless, after its leading slash, it starts with one of the
/// excluded prefixes.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    excluded: Regex,
}

impl RouteMatcher {
    pub fn new(excluded: &[&str]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = excluded.iter().map(|p| regex::escape(p)).collect();
        let pattern = if alternatives.is_empty() {
            // matches nothing
            r"[^\s\S]".to_string()
        } else {
            format!("^/(?:{})", alternatives.join("|"))
        };
        Ok(Self {
            excluded: Regex::new(&pattern)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with('/') && !self.excluded.is_match(path)
    }
}

static DEFAULT_MATCHER: LazyLock<RouteMatcher> =
    LazyLock::new(|| RouteMatcher::new(DEFAULT_EXCLUDED).expect("default exclusions are valid"));

impl Default for RouteMatcher {
    fn default() -> Self {
        DEFAULT_MATCHER.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_exclusions() {
        let matcher = RouteMatcher::default();

        assert!(matcher.matches("/"));
        assert!(matcher.matches("/upload"));
        assert!(matcher.matches("/video/123"));

        assert!(!matcher.matches("/api/videos"));
        assert!(!matcher.matches("/_next/static/chunk.js"));
        assert!(!matcher.matches("/_next/image?url=x"));
        assert!(!matcher.matches("/favicon.ico"));
        assert!(!matcher.matches("/sign-in"));
        assert!(!matcher.matches("/assets/logo.svg"));
    }

    #[test]
    fn test_prefix_semantics() {
        let matcher = RouteMatcher::default();

        // exclusions are prefixes, not path segments
        assert!(!matcher.matches("/apikeys"));
        assert!(matcher.matches("/faviconXico"));
        assert!(matcher.matches("/profile/api"));
    }

    #[test]
    fn test_empty_exclusions_gate_everything() {
        let matcher = RouteMatcher::new(&[]).unwrap();
        assert!(matcher.matches("/api/videos"));
    }
}
