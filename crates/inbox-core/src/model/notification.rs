//! Notification records as seen by callers

use super::spec::{RepoSpec, ThreadRef, UserSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Icon identifier, e.g. `"issue-opened"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OcticonId(pub String);

impl From<&str> for OcticonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for OcticonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 24-bit color without alpha channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Hexadecimal color string, e.g. `"#ff0000"` for red
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Display attributes of a resolved user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub spec: UserSpec,
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
}

impl User {
    /// Deterministic stand-in used when identity resolution fails
    pub fn fallback(spec: UserSpec) -> Self {
        Self {
            login: spec.to_string(),
            spec,
            avatar_url: String::new(),
            html_url: String::new(),
        }
    }
}

/// A notification delivered to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub repo: RepoSpec,
    pub thread_type: String,
    pub thread_id: u64,
    pub title: String,
    pub icon: OcticonId,
    pub color: Rgb,
    pub actor: User,
    pub updated_at: DateTime<Utc>,
    /// Address of the notification target
    pub html_url: String,
    /// Recipient subscribed to the thread itself rather than watching the repo
    pub participating: bool,
    pub read: bool,
}

impl Notification {
    pub fn thread(&self) -> ThreadRef {
        ThreadRef::new(self.repo.clone(), self.thread_type.clone(), self.thread_id)
    }
}

/// Content supplied by a producer when notifying subscribers of a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    #[serde(default)]
    pub icon: OcticonId,
    #[serde(default)]
    pub color: Rgb,
    pub actor: UserSpec,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub html_url: String,
}

/// Filters for listing a user's notifications
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only notifications whose repository matches exactly
    pub repo: Option<RepoSpec>,
    /// Also return read notifications still within the retention window
    pub include_read: bool,
}

impl ListOptions {
    pub fn unread() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            repo: None,
            include_read: true,
        }
    }

    pub fn with_repo(mut self, repo: RepoSpec) -> Self {
        self.repo = Some(repo);
        self
    }
}

/// Sort most recently updated first
///
/// Ties are broken by thread identity so the order is deterministic.
pub fn sort_newest_first(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| match b.updated_at.cmp(&a.updated_at) {
        Ordering::Equal => (&a.repo, &a.thread_type, a.thread_id, a.read).cmp(&(
            &b.repo,
            &b.thread_type,
            b.thread_id,
            b.read,
        )),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn notification(repo: &str, id: u64, updated_at: DateTime<Utc>) -> Notification {
        Notification {
            repo: RepoSpec::new(repo).unwrap(),
            thread_type: "issues".to_string(),
            thread_id: id,
            title: format!("Issue {id}"),
            icon: OcticonId::from("issue-opened"),
            color: Rgb::default(),
            actor: User::fallback(UserSpec::new(1, "example.org")),
            updated_at,
            html_url: String::new(),
            participating: false,
            read: false,
        }
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::new(0xff, 0, 0).hex(), "#ff0000");
        assert_eq!(Rgb::new(0x6c, 0xc6, 0x44).hex(), "#6cc644");
        assert_eq!(Rgb::default().hex(), "#000000");
    }

    #[test]
    fn test_fallback_user() {
        let user = User::fallback(UserSpec::new(9, "example.com"));
        assert_eq!(user.login, "9@example.com");
        assert!(user.avatar_url.is_empty());
        assert!(user.html_url.is_empty());
    }

    #[test]
    fn test_sort_newest_first() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut ns = vec![
            notification("r", 1, base),
            notification("r", 2, base + Duration::hours(2)),
            notification("r", 3, base + Duration::hours(1)),
        ];
        sort_newest_first(&mut ns);
        let ids: Vec<u64> = ns.iter().map(|n| n.thread_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_ties_are_deterministic() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut a = vec![notification("s", 1, at), notification("r", 5, at), notification("r", 2, at)];
        let mut b = vec![notification("r", 2, at), notification("s", 1, at), notification("r", 5, at)];
        sort_newest_first(&mut a);
        sort_newest_first(&mut b);
        assert_eq!(a, b);
        assert_eq!(a[0].thread_id, 2);
        assert_eq!(a[2].repo.as_str(), "s");
    }

    #[test]
    fn test_list_options_builders() {
        let repo = RepoSpec::new("r").unwrap();
        let opt = ListOptions::all().with_repo(repo.clone());
        assert!(opt.include_read);
        assert_eq!(opt.repo, Some(repo));
        assert!(!ListOptions::unread().include_read);
    }
}
