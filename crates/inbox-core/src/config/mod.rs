//! Configuration resolution
//!
//! Resolves configuration from multiple sources with priority:
//! 1. Explicit overrides (passed as parameters)
//! 2. Environment variables
//! 3. Config file (INBOX_CONFIG or ~/.config/thread-inbox/config.toml)
//! 4. Defaults

mod backend;
mod discovery;
mod types;

pub use backend::open_store;
pub use discovery::{default_config_home, resolve_config, ConfigError, ConfigOverrides};
pub use types::{Backend, Config, RetentionConfig, StoreConfig, APP_DIR};
