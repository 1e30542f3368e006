//! Session configuration loaded from environment variables.
//!
//! Each backend connection gets its own base address so deployments can
//! split the identity, chat, and document services across hosts.

use std::env;
use std::time::Duration;

/// Session configuration, loaded once at construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity service base URL (login, refresh, profile)
    pub identity_base_url: String,
    /// Conversational service base URL
    pub chat_base_url: String,
    /// Document service base URL
    pub docs_base_url: String,
    /// Interval between automatic document/stats polls
    pub poll_interval: Duration,
    /// Upper bound on the token refresh round trip
    pub refresh_timeout: Duration,
}

impl Default for Config {
    /// Defaults matching a local three-service dev setup.
    fn default() -> Self {
        Self {
            identity_base_url: "http://127.0.0.1:8000/api".to_string(),
            chat_base_url: "http://127.0.0.1:8002/api/chat".to_string(),
            docs_base_url: "http://127.0.0.1:8003/api".to_string(),
            poll_interval: Duration::from_secs(5),
            refresh_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// local-dev defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        Ok(Self {
            identity_base_url: env::var("IDENTITY_API_URL")
                .unwrap_or(defaults.identity_base_url),
            chat_base_url: env::var("CHAT_API_URL").unwrap_or(defaults.chat_base_url),
            docs_base_url: env::var("DOC_API_URL").unwrap_or(defaults.docs_base_url),
            poll_interval: duration_var("POLL_INTERVAL_SECS", defaults.poll_interval)?,
            refresh_timeout: duration_var("REFRESH_TIMEOUT_SECS", defaults.refresh_timeout)?,
        })
    }
}

/// Parse a whole-seconds duration from an env var.
fn duration_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.identity_base_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.refresh_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_duration_var_parses() {
        env::set_var("TEST_DURATION_OK", "2");
        assert_eq!(
            duration_var("TEST_DURATION_OK", Duration::from_secs(5)).unwrap(),
            Duration::from_secs(2)
        );
        env::remove_var("TEST_DURATION_OK");
    }

    #[test]
    fn test_invalid_duration_rejected() {
        env::set_var("TEST_DURATION_BAD", "soon");
        let result = duration_var("TEST_DURATION_BAD", Duration::from_secs(5));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        env::remove_var("TEST_DURATION_BAD");
    }
}
