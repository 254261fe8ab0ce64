//! Public notification service surface

use crate::context::Context;
use crate::error::Result;
use crate::model::{ListOptions, Notification, NotificationRequest, RepoSpec, ThreadRef, UserSpec};

/// The six inbox operations
///
/// The caller is taken from [`Context::caller`]. Every operation except
/// `subscribe` and `notify` acts on the caller's own inbox; all of them
/// reject an anonymous caller with [`crate::Error::PermissionDenied`].
pub trait NotificationService: Send + Sync {
    /// Caller's notifications, most recently updated first
    fn list(&self, ctx: &Context, opt: &ListOptions) -> Result<Vec<Notification>>;

    /// Number of unread notifications for the caller
    fn count(&self, ctx: &Context) -> Result<u64>;

    /// Deliver `request` to every subscriber of `thread` except the caller
    fn notify(&self, ctx: &Context, thread: &ThreadRef, request: &NotificationRequest)
    -> Result<()>;

    /// Register interest in `thread` (or the whole repo for a repo-scoped ref)
    fn subscribe(&self, ctx: &Context, thread: &ThreadRef, subscribers: &[UserSpec]) -> Result<()>;

    /// Mark the caller's notification for `thread` read; no-op if absent
    fn mark_read(&self, ctx: &Context, thread: &ThreadRef) -> Result<()>;

    /// Mark every unread notification of the caller in `repo` read
    fn mark_all_read(&self, ctx: &Context, repo: &RepoSpec) -> Result<()>;
}
