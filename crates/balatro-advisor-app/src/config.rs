//! Runtime configuration.
//!
//! Every setting has a built-in default. A few may be overridden through
//! environment variables; blank or unparsable values fall back to the default.
//! Sampling parameters are not configurable.

use std::time::Duration;

use balatro_advisor_model::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Title of the game window to capture.
pub const DEFAULT_WINDOW_TITLE: &str = "Balatro";

/// Default model request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Overrides [`AdvisorConfig::window_title`].
pub const ENV_WINDOW_TITLE: &str = "BALATRO_ADVISOR_WINDOW_TITLE";
/// Overrides [`AdvisorConfig::endpoint`].
pub const ENV_ENDPOINT: &str = "BALATRO_ADVISOR_ENDPOINT";
/// Overrides [`AdvisorConfig::model`].
pub const ENV_MODEL: &str = "BALATRO_ADVISOR_MODEL";
/// Overrides [`AdvisorConfig::request_timeout`], in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "BALATRO_ADVISOR_TIMEOUT_SECS";
/// `tracing` filter directive for the run log.
pub const ENV_LOG_FILTER: &str = "BALATRO_ADVISOR_LOG";

/// Settings for one application run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorConfig {
    /// Exact title of the window to capture.
    pub window_title: String,
    /// Model chat endpoint.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Overall model request timeout.
    pub request_timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AdvisorConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            window_title: lookup(ENV_WINDOW_TITLE)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.window_title),
            endpoint: non_blank(ENV_ENDPOINT).unwrap_or(defaults.endpoint),
            model: non_blank(ENV_MODEL).unwrap_or(defaults.model),
            request_timeout: non_blank(ENV_TIMEOUT_SECS)
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for environment overrides.

    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(
            AdvisorConfig::from_lookup(lookup_from(&[])),
            AdvisorConfig::default()
        );
    }

    #[test]
    fn overrides_apply_and_invalid_values_fall_back() {
        let config = AdvisorConfig::from_lookup(lookup_from(&[
            (ENV_WINDOW_TITLE, "Balatro (Steam)"),
            (ENV_ENDPOINT, " http://10.0.0.5:11434/api/chat "),
            (ENV_MODEL, ""),
            (ENV_TIMEOUT_SECS, "zero"),
        ]));

        assert_eq!(config.window_title, "Balatro (Steam)");
        assert_eq!(config.endpoint, "http://10.0.0.5:11434/api/chat");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn window_title_is_not_trimmed() {
        let config = AdvisorConfig::from_lookup(lookup_from(&[(ENV_WINDOW_TITLE, " Balatro ")]));
        assert_eq!(config.window_title, " Balatro ");
    }
}
