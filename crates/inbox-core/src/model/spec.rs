//! Identifiers for repositories, users, and threads

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque repository identifier, e.g. `github.com/user/repo`
///
/// Segments of the identifier become store directories, so construction
/// rejects empty, `.` and `..` segments as well as leading or trailing `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoSpec(String);

impl RepoSpec {
    /// Validate and wrap a repository identifier
    pub fn new(uri: impl Into<String>) -> Result<Self, Error> {
        let uri = uri.into();
        let invalid = |reason: &str| Error::InvalidRepo {
            repo: uri.clone(),
            reason: reason.to_string(),
        };

        if uri.is_empty() {
            return Err(invalid("empty repository identifier"));
        }
        if uri.starts_with('/') || uri.ends_with('/') {
            return Err(invalid("leading or trailing '/'"));
        }
        if uri.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(invalid("empty or relative path segment"));
        }
        if uri.contains('\0') || uri.contains('\\') {
            return Err(invalid("forbidden character"));
        }
        Ok(Self(uri))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RepoSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RepoSpec> for String {
    fn from(repo: RepoSpec) -> Self {
        repo.0
    }
}

impl FromStr for RepoSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A user across identity realms: numeric id plus domain
///
/// Id 0 denotes an anonymous (unauthenticated) user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct UserSpec {
    pub id: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
}

impl UserSpec {
    pub fn new(id: u64, domain: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
        }
    }

    /// The unauthenticated identity
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.id == 0
    }
}

/// Canonical `{id}@{domain}` form
impl fmt::Display for UserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.domain)
    }
}

impl FromStr for UserSpec {
    type Err = Error;

    /// Parse `"1@example.org"` into `UserSpec { id: 1, domain: "example.org" }`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| Error::InvalidUserSpec {
            spec: s.to_string(),
            reason,
        };
        let (id, domain) = s
            .split_once('@')
            .ok_or_else(|| invalid("missing '@' separator".to_string()))?;
        let id = id
            .parse::<u64>()
            .map_err(|e| invalid(format!("invalid id: {e}")))?;
        Ok(Self::new(id, domain))
    }
}

/// The subject of a notification: (repo, thread type, thread id)
///
/// An empty thread type with id 0 addresses the whole repository and is
/// only meaningful as the scope of a watch subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadRef {
    pub repo: RepoSpec,
    pub thread_type: String,
    pub thread_id: u64,
}

impl ThreadRef {
    pub fn new(repo: RepoSpec, thread_type: impl Into<String>, thread_id: u64) -> Self {
        Self {
            repo,
            thread_type: thread_type.into(),
            thread_id,
        }
    }

    /// Whole-repository scope used for watch subscriptions
    pub fn repo_scope(repo: RepoSpec) -> Self {
        Self::new(repo, "", 0)
    }

    pub fn is_repo_scope(&self) -> bool {
        self.thread_type.is_empty() && self.thread_id == 0
    }
}

impl fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_repo_scope() {
            write!(f, "{}", self.repo)
        } else {
            write!(f, "{}#{}/{}", self.repo, self.thread_type, self.thread_id)
        }
    }
}
