//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use ramp_store::StorageOptions;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Log output configuration
    pub log: LogConfig,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding the JSON documents
    pub data_dir: PathBuf,
    /// Per-operation timeout
    pub timeout: Duration,
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

impl StorageConfig {
    /// Options for opening the store
    pub fn options(&self) -> StorageOptions {
        StorageOptions::new(self.data_dir.clone()).with_timeout(self.timeout)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DaemonResult<Self> {
        Ok(Self {
            environment: Self::load_environment(&lookup)?,
            storage: Self::load_storage_config(&lookup)?,
            log: Self::load_log_config(&lookup)?,
        })
    }

    /// Create test configuration rooted at `data_dir`.
    pub fn test(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                data_dir: data_dir.into(),
                timeout: Duration::from_secs(1),
            },
            log: LogConfig { json: false },
            environment: Environment::Test,
        }
    }

    fn load_environment(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<Environment> {
        let env_str = lookup("RAMP_ENV").unwrap_or_else(|| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid RAMP_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_storage_config(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> DaemonResult<StorageConfig> {
        let data_dir = lookup("RAMP_DATA_DIR")
            .or_else(|| lookup("STORAGE_DIR"))
            .filter(|dir| !dir.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        let timeout_ms = match lookup("RAMP_STORAGE_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().ok().filter(|ms| *ms > 0).ok_or_else(|| {
                DaemonError::Config(format!("Invalid RAMP_STORAGE_TIMEOUT_MS: {}", raw))
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(StorageConfig {
            data_dir: PathBuf::from(data_dir),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    fn load_log_config(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<LogConfig> {
        let json = match lookup("RAMP_LOG_JSON").as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(DaemonError::Config(format!("Invalid RAMP_LOG_JSON: {}", other)))
            },
        };
        Ok(LogConfig { json })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: PathBuf::from(DEFAULT_DATA_DIR),
                timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            },
            log: LogConfig { json: false },
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(config.storage.timeout, Duration::from_secs(5));
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.log.json);
    }

    #[test]
    fn test_empty_environment_matches_default() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        let default = Config::default();

        assert_eq!(config.storage, default.storage);
        assert_eq!(config.log, default.log);
        assert_eq!(config.environment, default.environment);
    }

    #[test]
    fn test_data_dir_fallback() {
        let config = Config::from_lookup(lookup(&[("STORAGE_DIR", "/srv/legacy")])).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/legacy"));

        let config = Config::from_lookup(lookup(&[
            ("STORAGE_DIR", "/srv/legacy"),
            ("RAMP_DATA_DIR", "/srv/ramp"),
        ]))
        .unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/ramp"));
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::from_lookup(lookup(&[
            ("RAMP_ENV", "prod"),
            ("RAMP_STORAGE_TIMEOUT_MS", "250"),
            ("RAMP_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.storage.timeout, Duration::from_millis(250));
        assert!(config.log.json);
        assert_eq!(config.storage.options().timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for pairs in [
            [("RAMP_ENV", "staging")],
            [("RAMP_STORAGE_TIMEOUT_MS", "soon")],
            [("RAMP_STORAGE_TIMEOUT_MS", "0")],
            [("RAMP_LOG_JSON", "maybe")],
        ] {
            let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, DaemonError::Config(_)), "{:?}", pairs);
        }
    }

    #[test]
    fn test_test_config() {
        let config = Config::test("/tmp/ramp-test");

        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/ramp-test"));
    }
}
