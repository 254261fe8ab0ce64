//! Identity resolution for notification actors

use crate::context::Context;
use crate::model::{User, UserSpec};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps a user spec to display attributes
pub trait UserResolver: Send + Sync {
    fn get(&self, ctx: &Context, user: &UserSpec) -> Result<User>;
}

impl<R: UserResolver + ?Sized> UserResolver for Arc<R> {
    fn get(&self, ctx: &Context, user: &UserSpec) -> Result<User> {
        (**self).get(ctx, user)
    }
}

/// Resolve `user`, substituting [`User::fallback`] on any failure
pub fn resolve_or_fallback<R>(resolver: &R, ctx: &Context, user: &UserSpec) -> User
where
    R: UserResolver + ?Sized,
{
    match resolver.get(ctx, user) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!(user = %user, error = %e, "User lookup failed, using fallback identity");
            User::fallback(user.clone())
        }
    }
}

/// Fixed in-memory set of known users
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<UserSpec, User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: User) {
        self.users.insert(user.spec.clone(), user);
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.insert(user);
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<User> for UserDirectory {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        let mut dir = Self::new();
        for user in iter {
            dir.insert(user);
        }
        dir
    }
}

impl UserResolver for UserDirectory {
    fn get(&self, _ctx: &Context, user: &UserSpec) -> Result<User> {
        self.users
            .get(user)
            .cloned()
            .ok_or_else(|| anyhow!("user {user} not found"))
    }
}
