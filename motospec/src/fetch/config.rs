//! Configuration for HTTP fetching.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::request::DEFAULT_HEADER_SET;
use super::retry::RetryPolicy;

/// Configuration for HTTP fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-attempt request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Base URL that relative links are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Named header sets a request can select.
    #[serde(default = "default_header_sets")]
    pub header_sets: BTreeMap<String, BTreeMap<String, String>>,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_timeout() -> f64 {
    10.0
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; motospec/0.1)".to_string()
}

fn default_base_url() -> String {
    "https://www.autoevolution.com/".to_string()
}

fn default_header_sets() -> BTreeMap<String, BTreeMap<String, String>> {
    let headers = [
        ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        ("Accept-Language", "en-US,en;q=0.5"),
        ("Cache-Control", "no-cache"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let mut sets = BTreeMap::new();
    sets.insert(DEFAULT_HEADER_SET.to_string(), headers);
    sets
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            base_url: default_base_url(),
            header_sets: default_header_sets(),
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Adds a header to a named set, creating the set if needed.
    #[must_use]
    pub fn with_header(
        mut self,
        set: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.header_sets
            .entry(set.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds.max(0.0))
    }

    /// Headers of the named set, if configured.
    #[must_use]
    pub fn header_set(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.header_sets.get(name)
    }
}
