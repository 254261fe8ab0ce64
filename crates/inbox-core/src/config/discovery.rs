//! Configuration discovery and resolution

use super::types::{Backend, Config, APP_DIR};
use crate::fs::FsError;
use crate::retention::{parse_duration, ReadStrategy};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A setting holds a value that cannot be used
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// The configured store could not be opened
    #[error("Failed to open store: {0}")]
    Store(#[from] FsError),
}

/// Explicit overrides, typically from an embedding application's flags
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Override storage backend
    pub backend: Option<Backend>,
    /// Override store root directory
    pub root: Option<PathBuf>,
    /// Override read-notification max age
    pub max_age: Option<String>,
    /// Override read strategy
    pub strategy: Option<ReadStrategy>,
    /// Path to config file override
    pub config_path: Option<PathBuf>,
}

/// Platform configuration directory for this application
pub fn default_config_home() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

/// Resolve configuration from all sources
///
/// Priority (highest to lowest):
/// 1. Explicit overrides
/// 2. Environment variables (`INBOX_ROOT`, `INBOX_RETENTION`, `INBOX_READ_STRATEGY`)
/// 3. Config file (`overrides.config_path`, `INBOX_CONFIG`, or
///    `{config_home}/config.toml`)
/// 4. Defaults
///
/// A config file that fails to parse is logged and ignored. An explicitly
/// named file that does not exist is an error.
pub fn resolve_config(
    overrides: &ConfigOverrides,
    config_home: Option<&Path>,
) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    // 3. Config file
    let explicit = overrides
        .config_path
        .clone()
        .or_else(|| std::env::var_os("INBOX_CONFIG").map(PathBuf::from));
    let config_path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file not found: {}", path.display()),
                )));
            }
            Some(path)
        }
        None => config_home
            .map(|home| home.join("config.toml"))
            .filter(|path| path.exists()),
    };
    if let Some(path) = config_path {
        match load_config_file(&path) {
            Ok(file_config) => config = file_config,
            Err(e) => warn!("Failed to parse config at {path:?}: {e}"),
        }
    }

    // 2. Environment variables
    apply_env_overrides(&mut config);

    // 1. Explicit overrides
    apply_overrides(&mut config, overrides);

    validate(&config)?;
    Ok(config)
}

/// Load config from a TOML file
fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

/// Apply environment variable overrides
fn apply_env_overrides(config: &mut Config) {
    if let Some(root) = std::env::var_os("INBOX_ROOT") {
        config.store.root = Some(PathBuf::from(root));
    }

    if let Ok(max_age) = std::env::var("INBOX_RETENTION") {
        config.retention.max_age = max_age;
    }

    if let Ok(strategy) = std::env::var("INBOX_READ_STRATEGY") {
        match strategy.parse() {
            Ok(strategy) => config.retention.strategy = strategy,
            Err(e) => warn!("Ignoring INBOX_READ_STRATEGY: {e}"),
        }
    }
}

fn apply_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(backend) = overrides.backend {
        config.store.backend = backend;
    }

    if let Some(ref root) = overrides.root {
        config.store.root = Some(root.clone());
    }

    if let Some(ref max_age) = overrides.max_age {
        config.retention.max_age = max_age.clone();
    }

    if let Some(strategy) = overrides.strategy {
        config.retention.strategy = strategy;
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    parse_duration(&config.retention.max_age).map_err(|e| ConfigError::InvalidValue {
        key: "retention.max_age".to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    fn clear_env() {
        unsafe {
            env::remove_var("INBOX_ROOT");
            env::remove_var("INBOX_RETENTION");
            env::remove_var("INBOX_READ_STRATEGY");
            env::remove_var("INBOX_CONFIG");
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();
        let temp = TempDir::new().unwrap();

        let config = resolve_config(&ConfigOverrides::default(), Some(temp.path())).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_config_file_is_loaded() {
        clear_env();
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            r#"
[store]
backend = "memory"

[retention]
max_age = "7d"
strategy = "delete"
"#,
        )
        .unwrap();

        let config = resolve_config(&ConfigOverrides::default(), Some(temp.path())).unwrap();

        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.retention.max_age, "7d");
        assert_eq!(config.retention.strategy, ReadStrategy::Delete);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[retention]\nmax_age = \"7d\"\n").unwrap();

        unsafe {
            env::set_var("INBOX_ROOT", "/srv/inbox");
            env::set_var("INBOX_RETENTION", "48h");
            env::set_var("INBOX_READ_STRATEGY", "delete");
        }

        let config = resolve_config(&ConfigOverrides::default(), Some(temp.path())).unwrap();
        clear_env();

        assert_eq!(config.store.root, Some(PathBuf::from("/srv/inbox")));
        assert_eq!(config.retention.max_age, "48h");
        assert_eq!(config.retention.strategy, ReadStrategy::Delete);
    }

    #[test]
    #[serial]
    fn test_invalid_strategy_env_is_ignored() {
        clear_env();
        unsafe {
            env::set_var("INBOX_READ_STRATEGY", "shred");
        }

        let config = resolve_config(&ConfigOverrides::default(), None).unwrap();
        clear_env();

        assert_eq!(config.retention.strategy, ReadStrategy::Archive);
    }

    #[test]
    #[serial]
    fn test_explicit_overrides_win() {
        clear_env();
        unsafe {
            env::set_var("INBOX_ROOT", "/from/env");
        }

        let overrides = ConfigOverrides {
            backend: Some(Backend::Memory),
            root: Some(PathBuf::from("/from/flags")),
            max_age: Some("1w".to_string()),
            strategy: Some(ReadStrategy::Delete),
            config_path: None,
        };
        let config = resolve_config(&overrides, None).unwrap();
        clear_env();

        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.store.root, Some(PathBuf::from("/from/flags")));
        assert_eq!(config.retention.max_age, "1w");
        assert_eq!(config.retention.strategy, ReadStrategy::Delete);
    }

    #[test]
    #[serial]
    fn test_config_path_from_env() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("inbox.toml");
        std::fs::write(&path, "[store]\nbackend = \"memory\"\n").unwrap();

        unsafe {
            env::set_var("INBOX_CONFIG", &path);
        }
        let config = resolve_config(&ConfigOverrides::default(), None).unwrap();
        clear_env();

        assert_eq!(config.store.backend, Backend::Memory);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_config_is_error() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            config_path: Some(temp.path().join("missing.toml")),
            ..ConfigOverrides::default()
        };

        assert!(matches!(resolve_config(&overrides, None), Err(ConfigError::Io(_))));
    }

    #[test]
    #[serial]
    fn test_malformed_config_handled_gracefully() {
        clear_env();
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "invalid toml [[[").unwrap();

        let config = resolve_config(&ConfigOverrides::default(), Some(temp.path())).unwrap();
        assert_eq!(config, Config::default());

        assert!(load_config_file(&temp.path().join("config.toml")).is_err());
    }

    #[test]
    #[serial]
    fn test_invalid_max_age_is_rejected() {
        clear_env();
        let overrides = ConfigOverrides {
            max_age: Some("forever".to_string()),
            ..ConfigOverrides::default()
        };

        let err = resolve_config(&overrides, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "retention.max_age"));
    }
}
