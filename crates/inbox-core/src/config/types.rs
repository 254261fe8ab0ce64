//! Configuration types

use crate::retention::{parse_duration, ReadStrategy, RetentionPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory name used under the platform data and config directories
pub const APP_DIR: &str = "thread-inbox";

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Read-notification retention
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Storage backend configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Root directory for the disk backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl StoreConfig {
    /// Configured root, or `{data_dir}/thread-inbox` (`./thread-inbox` when
    /// the platform has no data directory)
    pub fn root_or_default(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.clone(),
            None => dirs::data_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(APP_DIR)),
        }
    }
}

/// Storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Directory tree on the local filesystem
    #[default]
    Disk,
    /// Process-local tree, lost on exit
    Memory,
}

/// Retention configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Maximum age of read notifications (duration string: "30d", "720h", "4w")
    #[serde(default = "default_max_age")]
    pub max_age: String,
    /// What marking a notification read does: "archive" or "delete"
    #[serde(default)]
    pub strategy: ReadStrategy,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age: default_max_age(),
            strategy: ReadStrategy::default(),
        }
    }
}

impl RetentionConfig {
    pub fn policy(&self) -> anyhow::Result<RetentionPolicy> {
        Ok(RetentionPolicy {
            max_age: parse_duration(&self.max_age)?,
            strategy: self.strategy,
        })
    }
}

fn default_max_age() -> String {
    "30d".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.store.backend, Backend::Disk);
        assert!(config.store.root.is_none());
        assert_eq!(config.retention.max_age, "30d");
        assert_eq!(config.retention.strategy, ReadStrategy::Archive);
        assert_eq!(config.retention.policy().unwrap(), RetentionPolicy::default());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.store.root = Some(PathBuf::from("/var/lib/thread-inbox"));
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let toml_str = r#"
[retention]
strategy = "delete"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.retention.max_age, "30d");
        assert_eq!(config.retention.strategy, ReadStrategy::Delete);
    }

    #[test]
    fn test_memory_backend_parse() {
        let config: Config = toml::from_str("[store]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.store.backend, Backend::Memory);
    }

    #[test]
    fn test_retention_policy_conversion() {
        let retention = RetentionConfig {
            max_age: "2w".to_string(),
            strategy: ReadStrategy::Delete,
        };
        let policy = retention.policy().unwrap();
        assert_eq!(policy.max_age, Duration::weeks(2));
        assert_eq!(policy.strategy, ReadStrategy::Delete);

        let bad = RetentionConfig {
            max_age: "soon".to_string(),
            ..RetentionConfig::default()
        };
        assert!(bad.policy().is_err());
    }

    #[test]
    fn test_explicit_root_wins() {
        let store = StoreConfig {
            backend: Backend::Disk,
            root: Some(PathBuf::from("/tmp/inbox")),
        };
        assert_eq!(store.root_or_default(), PathBuf::from("/tmp/inbox"));
        assert!(StoreConfig::default().root_or_default().ends_with(APP_DIR));
    }
}
