//! Per-user notification inbox over a hierarchical key-value store
//!
//! Users subscribe to discussion threads, or to every thread in a
//! repository. When an actor posts a [`NotificationRequest`], every
//! subscriber except the actor gets an unread [`Notification`]. Owners
//! list, count and mark their notifications read; read ones are archived
//! and pruned after a retention window.
//!
//! The storage layer is the [`fs::FileSystem`] trait, implemented by an
//! in-memory tree ([`fs::MemFs`]) and a local directory ([`fs::OsFs`]).
//! [`NotificationStore`] implements [`NotificationService`] over either.

pub mod config;
pub mod context;
pub mod error;
pub mod fs;
pub mod layout;
pub mod logging;
pub mod model;
pub mod retention;
pub mod schema;
pub mod service;
pub mod store;
pub mod users;

pub use context::Context;
pub use error::{Error, Result};
pub use model::{
    ListOptions, Notification, NotificationRequest, OcticonId, RepoSpec, Rgb, ThreadRef, User,
    UserSpec,
};
pub use retention::{ReadStrategy, RetentionPolicy};
pub use service::NotificationService;
pub use store::NotificationStore;
pub use users::{UserDirectory, UserResolver};
