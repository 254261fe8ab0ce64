//! Public domain types for the notification inbox
//!
//! These types form the API contract consumed by serving layers. The
//! persisted representation lives in [`crate::schema`] and is converted at
//! the store boundary, so the on-disk format can evolve independently.

pub mod notification;
pub mod spec;

pub use notification::{
    sort_newest_first, ListOptions, Notification, NotificationRequest, OcticonId, Rgb, User,
};
pub use spec::{RepoSpec, ThreadRef, UserSpec};
