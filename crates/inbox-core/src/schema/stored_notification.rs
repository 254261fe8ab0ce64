//! Persisted notification record

use crate::error::Error;
use crate::model::{
    Notification, NotificationRequest, OcticonId, RepoSpec, Rgb, ThreadRef, User, UserSpec,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// On-disk form of [`RepoSpec`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRepo {
    pub uri: String,
}

/// On-disk form of [`UserSpec`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
}

/// On-disk form of [`Rgb`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// One notification file under `notifications/{user}/` or `read/{user}/`
///
/// Read state is not stored; it follows from which area holds the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredNotification {
    pub repo: StoredRepo,
    pub thread_type: String,
    pub thread_id: u64,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    pub color: StoredRgb,
    pub actor: StoredUser,
    /// RFC 3339 UTC timestamp
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub participating: bool,

    /// Unknown fields for forward compatibility
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl From<&RepoSpec> for StoredRepo {
    fn from(repo: &RepoSpec) -> Self {
        Self {
            uri: repo.as_str().to_string(),
        }
    }
}

impl From<&UserSpec> for StoredUser {
    fn from(user: &UserSpec) -> Self {
        Self {
            id: user.id,
            domain: user.domain.clone(),
        }
    }
}

impl From<&StoredUser> for UserSpec {
    fn from(user: &StoredUser) -> Self {
        UserSpec::new(user.id, user.domain.clone())
    }
}

impl From<Rgb> for StoredRgb {
    fn from(c: Rgb) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
        }
    }
}

impl From<StoredRgb> for Rgb {
    fn from(c: StoredRgb) -> Self {
        Rgb::new(c.r, c.g, c.b)
    }
}

impl StoredNotification {
    /// Record delivered to one subscriber of `thread`
    pub fn from_request(
        thread: &ThreadRef,
        request: &NotificationRequest,
        participating: bool,
    ) -> Self {
        Self {
            repo: StoredRepo::from(&thread.repo),
            thread_type: thread.thread_type.clone(),
            thread_id: thread.thread_id,
            title: request.title.clone(),
            icon: request.icon.0.clone(),
            color: request.color.into(),
            actor: StoredUser::from(&request.actor),
            updated_at: request.updated_at,
            html_url: request.html_url.clone(),
            participating,
            unknown_fields: HashMap::new(),
        }
    }

    /// Record carrying the content of an already-delivered notification
    pub fn from_notification(n: &Notification) -> Self {
        Self {
            repo: StoredRepo::from(&n.repo),
            thread_type: n.thread_type.clone(),
            thread_id: n.thread_id,
            title: n.title.clone(),
            icon: n.icon.0.clone(),
            color: n.color.into(),
            actor: StoredUser::from(&n.actor.spec),
            updated_at: n.updated_at,
            html_url: n.html_url.clone(),
            participating: n.participating,
            unknown_fields: HashMap::new(),
        }
    }

    pub fn repo_spec(&self) -> Result<RepoSpec, Error> {
        RepoSpec::new(self.repo.uri.clone())
    }

    pub fn thread(&self) -> Result<ThreadRef, Error> {
        Ok(ThreadRef::new(
            self.repo_spec()?,
            self.thread_type.clone(),
            self.thread_id,
        ))
    }

    pub fn actor_spec(&self) -> UserSpec {
        UserSpec::from(&self.actor)
    }

    /// Convert to the public form, given the resolved actor and read state
    pub fn into_notification(self, actor: User, read: bool) -> Result<Notification, Error> {
        let repo = self.repo_spec()?;
        Ok(Notification {
            repo,
            thread_type: self.thread_type,
            thread_id: self.thread_id,
            title: self.title,
            icon: OcticonId(self.icon),
            color: self.color.into(),
            actor,
            updated_at: self.updated_at,
            html_url: self.html_url,
            participating: self.participating,
            read,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> NotificationRequest {
        NotificationRequest {
            title: "Issue 1".to_string(),
            icon: OcticonId::from("issue-opened"),
            color: Rgb::new(0x6c, 0xc6, 0x44),
            actor: UserSpec::new(2, "example.org"),
            updated_at: Utc.with_ymd_and_hms(2026, 2, 11, 14, 30, 0).unwrap(),
            html_url: "https://example.org/r/issues/1".to_string(),
        }
    }

    #[test]
    fn test_record_from_request() {
        let thread = ThreadRef::new(RepoSpec::new("r").unwrap(), "issues", 1);
        let rec = StoredNotification::from_request(&thread, &request(), true);

        assert_eq!(rec.repo.uri, "r");
        assert_eq!(rec.thread_type, "issues");
        assert_eq!(rec.thread_id, 1);
        assert_eq!(rec.icon, "issue-opened");
        assert_eq!(rec.actor_spec(), UserSpec::new(2, "example.org"));
        assert!(rec.participating);
        assert_eq!(rec.thread().unwrap(), thread);
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{
            "repo": {"uri": "github.com/user/repo"},
            "thread_type": "issues",
            "thread_id": 3,
            "title": "Issue 3",
            "icon": "issue-closed",
            "color": {"r": 189, "g": 44, "b": 0},
            "actor": {"id": 1, "domain": "example.org"},
            "updated_at": "2026-02-11T14:30:00Z",
            "html_url": "https://example.org/3"
        }"#;

        let rec: StoredNotification = serde_json::from_str(json).unwrap();
        assert_eq!(rec.thread_id, 3);
        assert!(!rec.participating, "participating defaults to false");

        let actor = User::fallback(rec.actor_spec());
        let n = rec.into_notification(actor, true).unwrap();
        assert_eq!(n.repo.as_str(), "github.com/user/repo");
        assert_eq!(n.color.hex(), "#bd2c00");
        assert_eq!(n.actor.login, "1@example.org");
        assert!(n.read);
    }

    #[test]
    fn test_record_preserves_unknown_fields() {
        let json = r#"{
            "repo": {"uri": "r"},
            "thread_type": "issues",
            "thread_id": 1,
            "title": "t",
            "color": {"r": 0, "g": 0, "b": 0},
            "actor": {"id": 1},
            "updated_at": "2026-02-11T14:30:00Z",
            "futureFeature": {"nested": "data"}
        }"#;

        let rec: StoredNotification = serde_json::from_str(json).unwrap();
        assert_eq!(rec.unknown_fields.len(), 1);
        assert_eq!(rec.actor.domain, "");

        let serialized = serde_json::to_string(&rec).unwrap();
        let reparsed: StoredNotification = serde_json::from_str(&serialized).unwrap();
        assert_eq!(
            reparsed.unknown_fields.get("futureFeature"),
            rec.unknown_fields.get("futureFeature")
        );
    }

    #[test]
    fn test_record_with_invalid_repo_fails_conversion() {
        let thread = ThreadRef::new(RepoSpec::new("r").unwrap(), "issues", 1);
        let mut rec = StoredNotification::from_request(&thread, &request(), false);
        rec.repo.uri = "../escape".to_string();

        let actor = User::fallback(rec.actor_spec());
        assert!(matches!(
            rec.into_notification(actor, false),
            Err(Error::InvalidRepo { .. })
        ));
    }
}
