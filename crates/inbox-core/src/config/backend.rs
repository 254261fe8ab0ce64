//! Opening the configured store

use super::discovery::ConfigError;
use super::types::{Backend, Config};
use crate::fs::{MemFs, OsFs};
use crate::service::NotificationService;
use crate::store::NotificationStore;
use crate::users::UserResolver;
use tracing::info;

/// Build the notification service described by `config`
pub fn open_store<R>(config: &Config, users: R) -> Result<Box<dyn NotificationService>, ConfigError>
where
    R: UserResolver + 'static,
{
    let policy = config
        .retention
        .policy()
        .map_err(|e| ConfigError::InvalidValue {
            key: "retention.max_age".to_string(),
            reason: e.to_string(),
        })?;

    match config.store.backend {
        Backend::Disk => {
            let root = config.store.root_or_default();
            info!(root = %root.display(), strategy = ?policy.strategy, "Opening disk notification store");
            let fs = OsFs::open(root)?;
            Ok(Box::new(NotificationStore::new(fs, users).with_retention(policy)))
        }
        Backend::Memory => {
            info!(strategy = ?policy.strategy, "Opening in-memory notification store");
            Ok(Box::new(NotificationStore::new(MemFs::new(), users).with_retention(policy)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::model::{ListOptions, UserSpec};
    use crate::users::UserDirectory;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_open_memory_store() {
        let mut config = Config::default();
        config.store.backend = Backend::Memory;

        let store = open_store(&config, UserDirectory::new()).unwrap();
        let ctx = Context::new(UserSpec::new(1, "example.org"));
        assert_eq!(store.count(&ctx).unwrap(), 0);
        assert!(store.list(&ctx, &ListOptions::all()).unwrap().is_empty());
    }

    #[test]
    fn test_open_disk_store_creates_root() {
        let temp = TempDir::new().unwrap();
        let root: PathBuf = temp.path().join("nested/inbox");
        let mut config = Config::default();
        config.store.root = Some(root.clone());

        let store = open_store(&config, UserDirectory::new()).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.count(&Context::new(UserSpec::new(1, ""))).unwrap(), 0);
    }

    #[test]
    fn test_open_store_rejects_bad_retention() {
        let mut config = Config::default();
        config.store.backend = Backend::Memory;
        config.retention.max_age = "eventually".to_string();

        assert!(matches!(
            open_store(&config, UserDirectory::new()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
