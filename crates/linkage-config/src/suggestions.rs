//! AI suggestion service settings.

use serde::{Deserialize, Serialize};

const fn default_max_suggestions() -> u32 {
    5
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuggestionsConfig {
    /// Base URL of the intake API, e.g. `https://api.example.org/v1`.
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: u32,

    /// User-initiated retries allowed after the service reports unavailable.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            max_suggestions: default_max_suggestions(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SuggestionsConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = SuggestionsConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.max_suggestions, 5);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn configured_when_base_url_set() {
        let config = SuggestionsConfig {
            base_url: "http://localhost:8080".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
    }
}
