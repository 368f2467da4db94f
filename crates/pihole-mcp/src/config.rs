//! Server configuration.
//!
//! Settings come from an optional TOML file, overridden by environment
//! variables. The file is read from `$PIHOLE_MCP_CONFIG` when set, otherwise
//! from `~/.config/pihole-mcp/config.toml` if it exists.
//!
//! ## Example Configuration
//!
//! ```toml
//! base_url = "http://192.168.1.2"
//! password = "app-password"
//! timeout_seconds = 15
//! connect_retries = 3
//! ```
//!
//! ## Environment
//!
//! | variable                                           | setting           |
//! |----------------------------------------------------|-------------------|
//! | `PIHOLE_BASE_URL`, `PIHOLE_URL`                    | `base_url`        |
//! | `PIHOLE_PASSWORD`, `PIHOLE_API_KEY`, `PIHOLE_TOKEN` | `password`        |
//! | `PIHOLE_TIMEOUT_SECONDS`                           | `timeout_seconds` |
//! | `PIHOLE_CONNECT_RETRIES`                           | `connect_retries` |
//!
//! Empty variables are ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::{info, warn};

use pihole_common::{Config, RetryConfig};

use crate::error::{Result, ServerError};

/// Names the configuration file explicitly.
pub const CONFIG_PATH_ENV: &str = "PIHOLE_MCP_CONFIG";

const BASE_URL_ENV: &[&str] = &["PIHOLE_BASE_URL", "PIHOLE_URL"];
const PASSWORD_ENV: &[&str] = &["PIHOLE_PASSWORD", "PIHOLE_API_KEY", "PIHOLE_TOKEN"];
const TIMEOUT_ENV: &str = "PIHOLE_TIMEOUT_SECONDS";
const RETRIES_ENV: &str = "PIHOLE_CONNECT_RETRIES";

/// Contents of the configuration file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Appliance address.
    pub base_url: Option<String>,
    /// Shared secret.
    pub password: Option<SecretString>,
    /// Request timeout in seconds. `0` disables the timeout.
    pub timeout_seconds: Option<u64>,
    /// Retries for refused or unreachable connections.
    pub connect_retries: Option<u32>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Client connection settings.
    pub client: Config,
    /// The file the settings were read from, if any.
    pub source: Option<PathBuf>,
}

impl ServerConfig {
    /// Loads configuration from the file and the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::load_with`].
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration, reading variables through `env`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if:
    /// - `$PIHOLE_MCP_CONFIG` names a file that does not exist
    /// - No base address is configured, or it is not an http(s) URL
    /// - A numeric variable does not parse
    ///
    /// Returns [`ServerError::Toml`] if the file is malformed.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

        let (file, source) = match lookup(CONFIG_PATH_ENV) {
            Some(explicit) => {
                let path = PathBuf::from(explicit);
                if !path.exists() {
                    return Err(ServerError::Config(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                (FileConfig::read(&path)?, Some(path))
            }
            None => match Self::config_path() {
                Some(path) if path.exists() => (FileConfig::read(&path)?, Some(path)),
                _ => (FileConfig::default(), None),
            },
        };

        if let Some(path) = &source {
            info!("Loaded configuration from {}", path.display());
        }

        let config = Self::resolve(file, &lookup)?;
        Ok(Self {
            client: config,
            source,
        })
    }

    /// The default configuration file path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pihole-mcp").join("config.toml"))
    }

    fn resolve(file: FileConfig, lookup: &impl Fn(&str) -> Option<String>) -> Result<Config> {
        let first = |keys: &[&str]| keys.iter().find_map(|key| lookup(key));

        let base_url = first(BASE_URL_ENV)
            .or(file.base_url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                ServerError::Config(
                    "PIHOLE_BASE_URL (or PIHOLE_URL) environment variable is required".to_string(),
                )
            })?;

        let mut config = Config::new(base_url);

        config.password = first(PASSWORD_ENV)
            .map(|p| SecretString::new(p.into()))
            .or(file.password);
        if config.is_anonymous() {
            warn!(
                "No Pi-hole password configured (PIHOLE_PASSWORD); admin operations will be sent unauthenticated"
            );
        }

        match parse_var::<u64>(lookup, TIMEOUT_ENV)?.or(file.timeout_seconds) {
            Some(0) => config = config.without_timeout(),
            Some(seconds) => config = config.with_timeout(seconds),
            None => {}
        }

        if let Some(retries) = parse_var::<u32>(lookup, RETRIES_ENV)?.or(file.connect_retries) {
            config = config.with_retry_config(RetryConfig {
                max_retries: retries,
                ..RetryConfig::default()
            });
        }

        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ServerError::Config(format!("Invalid {key} '{raw}': {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;

    use secrecy::ExposeSecret;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn resolve(pairs: &[(&str, &str)]) -> Result<Config> {
        let env = env_from(pairs);
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());
        ServerConfig::resolve(FileConfig::default(), &lookup)
    }

    #[test]
    fn test_base_url_required() {
        let err = resolve(&[]).unwrap_err();
        assert!(matches!(err, ServerError::Config(ref msg) if msg.contains("PIHOLE_BASE_URL")));

        let err = resolve(&[("PIHOLE_BASE_URL", "")]).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_env_fallbacks() {
        let config = resolve(&[("PIHOLE_URL", "http://pi.hole/"), ("PIHOLE_TOKEN", "tok")]).unwrap();
        assert_eq!(config.base_url(), "http://pi.hole");
        assert_eq!(config.password.unwrap().expose_secret(), "tok");

        let config = resolve(&[
            ("PIHOLE_BASE_URL", "http://primary"),
            ("PIHOLE_URL", "http://fallback"),
            ("PIHOLE_PASSWORD", ""),
            ("PIHOLE_API_KEY", "key"),
        ])
        .unwrap();
        assert_eq!(config.base_url(), "http://primary");
        assert_eq!(config.password.unwrap().expose_secret(), "key");
    }

    #[test]
    fn test_missing_password_is_anonymous() {
        let config = resolve(&[("PIHOLE_BASE_URL", "http://pi.hole")]).unwrap();
        assert!(config.is_anonymous());
    }

    #[test]
    fn test_numeric_settings() {
        let config = resolve(&[
            ("PIHOLE_BASE_URL", "http://pi.hole"),
            ("PIHOLE_TIMEOUT_SECONDS", "5"),
            ("PIHOLE_CONNECT_RETRIES", "0"),
        ])
        .unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.retry_config.max_retries, 0);

        let config = resolve(&[
            ("PIHOLE_BASE_URL", "http://pi.hole"),
            ("PIHOLE_TIMEOUT_SECONDS", "0"),
        ])
        .unwrap();
        assert_eq!(config.timeout(), None);

        let err = resolve(&[
            ("PIHOLE_BASE_URL", "http://pi.hole"),
            ("PIHOLE_TIMEOUT_SECONDS", "soon"),
        ])
        .unwrap_err();
        assert!(matches!(err, ServerError::Config(ref msg) if msg.contains("PIHOLE_TIMEOUT_SECONDS")));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = resolve(&[("PIHOLE_BASE_URL", "pi.hole")]).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "http://from-file"
password = "file-secret"
timeout_seconds = 12
connect_retries = 4
"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = ServerConfig::load_with(env_from(&[(CONFIG_PATH_ENV, path.as_str())])).unwrap();
        assert_eq!(config.client.base_url(), "http://from-file");
        assert_eq!(config.client.password.as_ref().unwrap().expose_secret(), "file-secret");
        assert_eq!(config.client.timeout(), Some(Duration::from_secs(12)));
        assert_eq!(config.client.retry_config.max_retries, 4);
        assert_eq!(config.source.as_deref(), Some(file.path()));

        let config = ServerConfig::load_with(env_from(&[
            (CONFIG_PATH_ENV, path.as_str()),
            ("PIHOLE_BASE_URL", "http://from-env"),
            ("PIHOLE_TIMEOUT_SECONDS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.client.base_url(), "http://from-env");
        assert_eq!(config.client.password.as_ref().unwrap().expose_secret(), "file-secret");
        assert_eq!(config.client.timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ServerConfig::load_with(env_from(&[
            (CONFIG_PATH_ENV, missing.to_str().unwrap()),
            ("PIHOLE_BASE_URL", "http://pi.hole"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ServerError::Config(ref msg) if msg.contains("not found")));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = ").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let err = ServerConfig::load_with(env_from(&[(CONFIG_PATH_ENV, path.as_str())])).unwrap_err();
        assert!(matches!(err, ServerError::Toml(_)));
    }
}
