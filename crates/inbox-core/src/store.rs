//! Notification store over a hierarchical filesystem
//!
//! One store instance owns one [`FileSystem`] and guards it with a single
//! readers-writer lock. `count` and unread-only `list` take the read side;
//! everything that mutates the tree takes the write side, including
//! `list` with `include_read`, which prunes expired read records.
//!
//! Per (user, thread) the record lives in exactly one place:
//!
//! ```text
//! absent --notify--> unread --mark_read--> read --expiry/notify--> absent
//! ```
//!
//! Under [`ReadStrategy::Delete`] marking read goes straight to absent.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::fs::util::{
    create_empty_file, decode_json_file, encode_json_file, ensure_dir, exists, read_dir_or_empty,
    remove_dir_if_empty, remove_if_present,
};
use crate::fs::FileSystem;
use crate::layout::{
    notification_key, notification_path, notifications_dir, parse_user_segment, read_dir,
    read_path, subscriber_path, subscribers_dir,
};
use crate::model::{
    sort_newest_first, ListOptions, Notification, NotificationRequest, RepoSpec, ThreadRef,
    UserSpec,
};
use crate::retention::{ReadStrategy, RetentionPolicy};
use crate::schema::StoredNotification;
use crate::service::NotificationService;
use crate::users::{resolve_or_fallback, UserResolver};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Filesystem-backed [`NotificationService`]
pub struct NotificationStore<F, R> {
    fs: RwLock<F>,
    users: R,
    policy: RetentionPolicy,
}

impl<F, R> NotificationStore<F, R>
where
    F: FileSystem,
    R: UserResolver,
{
    /// Create a store using `fs` for storage and `users` to resolve actors
    pub fn new(fs: F, users: R) -> Self {
        Self {
            fs: RwLock::new(fs),
            users,
            policy: RetentionPolicy::default(),
        }
    }

    pub fn with_retention(mut self, policy: RetentionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn retention(&self) -> &RetentionPolicy {
        &self.policy
    }

    fn read_fs(&self) -> RwLockReadGuard<'_, F> {
        self.fs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_fs(&self) -> RwLockWriteGuard<'_, F> {
        self.fs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Import the notifications visible to `ctx` in `src` as unread
    /// notifications of `dst`, returning how many were copied
    pub fn copy_from(
        &self,
        ctx: &Context,
        src: &dyn NotificationService,
        dst: &UserSpec,
    ) -> Result<usize> {
        // List before taking our own lock; `src` may be this store.
        let ns = src.list(ctx, &ListOptions::default())?;

        let fs = self.write_fs();
        let cancel = ctx.cancel_token();
        ensure_dir(&*fs, cancel, &notifications_dir(dst))?;
        for n in &ns {
            let key = notification_key(&n.thread());
            remove_if_present(&*fs, cancel, &read_path(dst, &key))?;
            let record = StoredNotification::from_notification(n);
            encode_json_file(&*fs, cancel, &notification_path(dst, &key), &record)?;
        }

        info!(count = ns.len(), dst = %dst, "Copied notifications");
        Ok(ns.len())
    }

    fn collect(
        &self,
        fs: &F,
        ctx: &Context,
        dir: &str,
        opt: &ListOptions,
        read: bool,
        out: &mut Vec<Notification>,
    ) -> Result<()> {
        let cancel = ctx.cancel_token();
        let now = Utc::now();
        for entry in read_dir_or_empty(fs, cancel, dir)? {
            if entry.is_dir {
                continue;
            }
            let path = format!("{dir}/{}", entry.name);
            let record: StoredNotification = decode_json_file(fs, cancel, &path)?;

            if read && self.policy.is_expired(record.updated_at, now) {
                debug!(path = %path, "Pruning expired read notification");
                remove_if_present(fs, cancel, &path)?;
                continue;
            }

            if let Some(repo) = &opt.repo
                && record.repo.uri != repo.as_str()
            {
                continue;
            }

            let actor = resolve_or_fallback(&self.users, ctx, &record.actor_spec());
            out.push(record.into_notification(actor, read)?);
        }
        Ok(())
    }

    /// Users with a marker directly under the scope's subscribers directory
    fn markers(&self, fs: &F, cancel: &CancellationToken, scope: &ThreadRef) -> Result<Vec<UserSpec>> {
        let mut users = Vec::new();
        for entry in read_dir_or_empty(fs, cancel, &subscribers_dir(scope))? {
            // Thread-scope directories live beside repo watcher markers
            if entry.is_dir {
                continue;
            }
            match parse_user_segment(&entry.name) {
                Ok(user) if user.is_anonymous() => {
                    warn!(scope = %scope, marker = %entry.name, "Skipping anonymous subscriber marker")
                }
                Ok(user) => users.push(user),
                Err(e) => warn!(scope = %scope, marker = %entry.name, error = %e, "Skipping unparsable subscriber marker"),
            }
        }
        Ok(users)
    }

    /// Move an unread record out of the unread area per the read strategy
    fn retire(&self, fs: &F, cancel: &CancellationToken, user: &UserSpec, key: &str) -> Result<()> {
        let unread = notification_path(user, key);
        match self.policy.strategy {
            ReadStrategy::Archive => {
                ensure_dir(fs, cancel, &read_dir(user))?;
                fs.rename(cancel, &unread, &read_path(user, key))?;
            }
            ReadStrategy::Delete => fs.remove_all(cancel, &unread)?,
        }
        Ok(())
    }
}

/// Reject anonymous or already-cancelled calls before taking the lock
fn begin(ctx: &Context) -> Result<&UserSpec> {
    if ctx.caller().is_anonymous() {
        return Err(Error::PermissionDenied);
    }
    if ctx.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(ctx.caller())
}

impl<F, R> NotificationService for NotificationStore<F, R>
where
    F: FileSystem,
    R: UserResolver,
{
    fn list(&self, ctx: &Context, opt: &ListOptions) -> Result<Vec<Notification>> {
        let caller = begin(ctx)?;
        let mut ns = Vec::new();

        if opt.include_read {
            let fs = self.write_fs();
            self.collect(&fs, ctx, &notifications_dir(caller), opt, false, &mut ns)?;
            self.collect(&fs, ctx, &read_dir(caller), opt, true, &mut ns)?;
            // Pruning may have emptied the read area
            remove_dir_if_empty(&*fs, ctx.cancel_token(), &read_dir(caller))?;
        } else {
            let fs = self.read_fs();
            self.collect(&fs, ctx, &notifications_dir(caller), opt, false, &mut ns)?;
        }

        sort_newest_first(&mut ns);
        Ok(ns)
    }

    fn count(&self, ctx: &Context) -> Result<u64> {
        let caller = begin(ctx)?;
        let fs = self.read_fs();
        let entries = read_dir_or_empty(&*fs, ctx.cancel_token(), &notifications_dir(caller))?;
        Ok(entries.iter().filter(|e| !e.is_dir).count() as u64)
    }

    fn notify(
        &self,
        ctx: &Context,
        thread: &ThreadRef,
        request: &NotificationRequest,
    ) -> Result<()> {
        let caller = begin(ctx)?;
        let fs = self.write_fs();
        let cancel = ctx.cancel_token();

        // Repo watchers first, then thread subscribers, so that thread
        // subscription wins the participating flag.
        let mut subscribers: BTreeMap<UserSpec, bool> = BTreeMap::new();
        let repo_scope = ThreadRef::repo_scope(thread.repo.clone());
        for user in self.markers(&fs, cancel, &repo_scope)? {
            subscribers.insert(user, false);
        }
        if !thread.is_repo_scope() {
            for user in self.markers(&fs, cancel, thread)? {
                subscribers.insert(user, true);
            }
        }

        // Never notify users of their own actions
        subscribers.remove(caller);

        let key = notification_key(thread);
        for (subscriber, participating) in &subscribers {
            // A previously read notification resurfaces as unread
            remove_if_present(&*fs, cancel, &read_path(subscriber, &key))?;
            ensure_dir(&*fs, cancel, &notifications_dir(subscriber))?;

            let record = StoredNotification::from_request(thread, request, *participating);
            encode_json_file(&*fs, cancel, &notification_path(subscriber, &key), &record)?;
        }

        debug!(thread = %thread, recipients = subscribers.len(), "Delivered notification");
        Ok(())
    }

    fn subscribe(&self, ctx: &Context, thread: &ThreadRef, subscribers: &[UserSpec]) -> Result<()> {
        begin(ctx)?;
        let fs = self.write_fs();
        for subscriber in subscribers {
            // Id 0 has no inbox to deliver into
            if subscriber.is_anonymous() {
                warn!(thread = %thread, "Ignoring anonymous subscriber");
                continue;
            }
            create_empty_file(&*fs, ctx.cancel_token(), &subscriber_path(thread, subscriber))?;
        }
        debug!(thread = %thread, count = subscribers.len(), "Subscribed users");
        Ok(())
    }

    fn mark_read(&self, ctx: &Context, thread: &ThreadRef) -> Result<()> {
        let caller = begin(ctx)?;
        let fs = self.write_fs();
        let cancel = ctx.cancel_token();

        let key = notification_key(thread);
        if !exists(&*fs, cancel, &notification_path(caller, &key))? {
            return Ok(());
        }
        self.retire(&fs, cancel, caller, &key)?;
        debug!(user = %caller, thread = %thread, "Marked notification read");

        remove_dir_if_empty(&*fs, cancel, &notifications_dir(caller))?;
        Ok(())
    }

    fn mark_all_read(&self, ctx: &Context, repo: &RepoSpec) -> Result<()> {
        let caller = begin(ctx)?;
        let fs = self.write_fs();
        let cancel = ctx.cancel_token();

        let dir = notifications_dir(caller);
        let mut marked = 0usize;
        for entry in read_dir_or_empty(&*fs, cancel, &dir)? {
            if entry.is_dir {
                continue;
            }
            let path = notification_path(caller, &entry.name);
            let record: StoredNotification = match decode_json_file(&*fs, cancel, &path) {
                Ok(record) => record,
                Err(e @ Error::Encoding { .. }) => {
                    warn!(path = %path, error = %e, "Skipping unreadable notification");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if record.repo.uri != repo.as_str() {
                continue;
            }
            self.retire(&fs, cancel, caller, &entry.name)?;
            marked += 1;
        }
        debug!(user = %caller, repo = %repo, marked, "Marked all notifications read");

        remove_dir_if_empty(&*fs, cancel, &dir)?;
        Ok(())
    }
}
