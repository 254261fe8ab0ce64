//! Persisted record types
//!
//! These mirror the public [`crate::model`] types but describe the on-disk
//! JSON shape. Conversions between the two are pure functions, so the
//! stored format can change without touching the public API. Records keep
//! unknown fields for forward compatibility.

mod stored_notification;

pub use stored_notification::{StoredNotification, StoredRepo, StoredRgb, StoredUser};
