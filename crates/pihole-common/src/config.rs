//! Connection configuration for a Pi-hole appliance.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Backoff settings for retrying connection failures.
///
/// Only failures where no request reached the appliance (refused or
/// unreachable connections) are retried. HTTP responses, including error
/// statuses, are always handed back to the caller as-is.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pihole_common::RetryConfig;
///
/// let config = RetryConfig {
///     max_retries: 5,
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(5),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts before failing.
    pub max_retries: u32,
    /// Initial delay before the first retry attempt.
    pub initial_delay: Duration,
    /// Maximum delay between retry attempts (caps exponential growth).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// Configuration for a Pi-hole client.
///
/// Supplied once at startup and never mutated by the client.
///
/// # Security
///
/// The password is a `SecretString`: it is skipped on serialization and
/// redacted from `Debug` output.
///
/// # Examples
///
/// ```
/// use pihole_common::Config;
///
/// let config = Config::new("http://pi.hole/")
///     .with_password("hunter2")
///     .with_timeout(10);
///
/// assert_eq!(config.base_url(), "http://pi.hole");
/// assert!(!config.is_anonymous());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network origin of the appliance, e.g. `http://192.168.1.2`.
    pub base_url: String,
    /// Shared secret submitted to the authentication endpoint.
    #[serde(skip_serializing, default)]
    pub password: Option<SecretString>,
    /// Request timeout in seconds. `None` disables the timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: Option<u64>,
    /// Retry policy for connection failures.
    #[serde(skip)]
    pub retry_config: RetryConfig,
}

#[allow(clippy::unnecessary_wraps)]
const fn default_timeout_seconds() -> Option<u64> {
    Some(DEFAULT_TIMEOUT_SECONDS)
}

impl Config {
    /// Creates a configuration for the given base address.
    ///
    /// Trailing `/` characters are stripped.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            password: None,
            timeout_seconds: default_timeout_seconds(),
            retry_config: RetryConfig::default(),
        }
    }

    /// Sets the shared secret used to open a session.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into().into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Removes the request timeout.
    #[must_use]
    pub const fn without_timeout(mut self) -> Self {
        self.timeout_seconds = None;
        self
    }

    /// Sets the retry policy for connection failures.
    #[must_use]
    pub const fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// The base address with any trailing `/` removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns `true` when no shared secret is configured.
    ///
    /// An empty password counts as absent.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.password
            .as_ref()
            .is_none_or(|p| p.expose_secret().is_empty())
    }

    /// The request timeout as a `Duration`, if one is set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base address is empty, does not parse as a
    /// URL, or does not use the `http`/`https` scheme.
    pub fn validate(&self) -> anyhow::Result<()> {
        let base_url = self.base_url();
        if base_url.is_empty() {
            anyhow::bail!("Base URL must not be empty");
        }

        let parsed = url::Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid base URL '{base_url}': {e}"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!(
                "Base URL must use http or https, got '{}'",
                parsed.scheme()
            );
        }

        if parsed.query().is_some() || parsed.fragment().is_some() {
            anyhow::bail!("Base URL must not contain a query or fragment");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn test_trailing_slashes_are_stripped() {
        let config = Config::new("http://pi.hole//");
        assert_eq!(config.base_url, "http://pi.hole");
        assert_eq!(config.base_url(), "http://pi.hole");
    }

    #[test]
    fn test_base_url_accessor_normalizes_deserialized_value() {
        let config: Config = serde_json::from_str(r#"{"base_url": "http://pi.hole/"}"#).unwrap();
        assert_eq!(config.base_url(), "http://pi.hole");
        assert_eq!(config.timeout_seconds, Some(DEFAULT_TIMEOUT_SECONDS));
    }

    #[test]
    fn test_anonymous_without_password() {
        assert!(Config::new("http://pi.hole").is_anonymous());
        assert!(Config::new("http://pi.hole").with_password("").is_anonymous());
        assert!(!Config::new("http://pi.hole").with_password("secret").is_anonymous());
    }

    #[test]
    fn test_password_never_serialized() {
        let config = Config::new("http://pi.hole").with_password("super-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::new("http://pi.hole").with_password("super-secret");
        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super-secret"));
    }

    #[test]
    fn test_timeout_builders() {
        let config = Config::new("http://pi.hole");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));

        let config = config.with_timeout(5);
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));

        let config = config.without_timeout();
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_validate() {
        assert!(Config::new("http://pi.hole").validate().is_ok());
        assert!(Config::new("https://10.0.0.2:8443/admin").validate().is_ok());
        assert!(Config::new("").validate().is_err());
        assert!(Config::new("pi.hole").validate().is_err());
        assert!(Config::new("ftp://pi.hole").validate().is_err());
        assert!(Config::new("http://pi.hole/?x=1").validate().is_err());
    }

    #[test]
    fn test_retry_config_disabled() {
        assert_eq!(RetryConfig::disabled().max_retries, 0);
        assert_eq!(RetryConfig::default().max_retries, 2);
    }
}
