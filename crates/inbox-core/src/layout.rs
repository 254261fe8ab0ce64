//! Store path layout and key encoding
//!
//! ```text
//! root
//! ├── notifications
//! │   └── {user}
//! │       └── {key}                     unread notification record
//! ├── read
//! │   └── {user}
//! │       └── {key}                     read (archived) notification record
//! └── subscribers
//!     └── {repo segments...}
//!         ├── {user}                    repo watcher marker (empty file)
//!         └── %T{threadType}-{threadID}
//!             └── {user}                thread subscriber marker (empty file)
//! ```
//!
//! `{user}` is `{id}@{domain}`. `{key}` is
//! `{repo}-{threadType}-{threadID}` where `/` in the repo becomes `-`.
//!
//! To keep keys reversible, `%` and `-` inside the repo and thread type are
//! percent-escaped (`%25`, `%2D`) before the repo's `/` are replaced, and
//! `/` inside a thread type becomes `%2F`. A key therefore contains exactly
//! two unescaped `-` beyond the repo's own separators, and is parsed from
//! the right. For the common case (`github.com/user/repo`, `issues`, `1`)
//! the key is just `github.com-user-repo-issues-1`.
//!
//! Under `subscribers/` the repo keeps its `/` segments with `%` escaped, so
//! no repo segment can start with the `%T` that marks a thread directory.

use crate::error::Error;
use crate::fs::util::join;
use crate::model::{RepoSpec, ThreadRef, UserSpec};
use std::fmt::Write;

pub const NOTIFICATIONS_DIR: &str = "notifications";
pub const READ_DIR: &str = "read";
pub const SUBSCRIBERS_DIR: &str = "subscribers";

/// Prefix of thread-scope directories under a repo's subscribers directory
const THREAD_DIR_PREFIX: &str = "%T";

/// Characters escaped in every encoded component
const ALWAYS_ESCAPED: [char; 3] = ['%', '\\', '\0'];

fn escape(s: &str, reserved: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if ALWAYS_ESCAPED.contains(&c) || reserved.contains(&c) {
            // Escaped characters are all ASCII
            let _ = write!(out, "%{:02X}", c as u32);
        } else {
            out.push(c);
        }
    }
    out
}

fn unescape(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn encode_repo(repo: &RepoSpec) -> String {
    escape(repo.as_str(), &['-']).replace('/', "-")
}

fn encode_thread_type(thread_type: &str) -> String {
    escape(thread_type, &['-', '/'])
}

/// Path segment for a user: `{id}@{domain}`
pub fn user_segment(user: &UserSpec) -> String {
    format!("{}@{}", user.id, escape(&user.domain, &['/']))
}

/// Inverse of [`user_segment`]
pub fn parse_user_segment(segment: &str) -> Result<UserSpec, Error> {
    let spec: UserSpec = segment.parse()?;
    let domain = unescape(&spec.domain).ok_or_else(|| Error::InvalidUserSpec {
        spec: segment.to_string(),
        reason: "malformed escape in domain".to_string(),
    })?;
    Ok(UserSpec::new(spec.id, domain))
}

/// File name of a notification for `thread` within a user's area
pub fn notification_key(thread: &ThreadRef) -> String {
    format!(
        "{}-{}-{}",
        encode_repo(&thread.repo),
        encode_thread_type(&thread.thread_type),
        thread.thread_id
    )
}

/// Recover the thread reference encoded by [`notification_key`]
pub fn parse_notification_key(key: &str) -> Result<ThreadRef, Error> {
    let invalid = || Error::InvalidKey {
        key: key.to_string(),
    };

    let (rest, id) = key.rsplit_once('-').ok_or_else(invalid)?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let thread_id: u64 = id.parse().map_err(|_| invalid())?;

    let (repo_enc, type_enc) = rest.rsplit_once('-').ok_or_else(invalid)?;
    let thread_type = unescape(type_enc).ok_or_else(invalid)?;
    let repo_uri = unescape(&repo_enc.replace('-', "/")).ok_or_else(invalid)?;
    let repo = RepoSpec::new(repo_uri).map_err(|_| invalid())?;

    let thread = ThreadRef::new(repo, thread_type, thread_id);
    // Reject non-canonical spellings (lowercase hex, leading zeros, ...)
    if notification_key(&thread) != key {
        return Err(invalid());
    }
    Ok(thread)
}

pub fn notifications_dir(user: &UserSpec) -> String {
    join([NOTIFICATIONS_DIR, user_segment(user).as_str()])
}

pub fn notification_path(user: &UserSpec, key: &str) -> String {
    join([notifications_dir(user).as_str(), key])
}

pub fn read_dir(user: &UserSpec) -> String {
    join([READ_DIR, user_segment(user).as_str()])
}

pub fn read_path(user: &UserSpec, key: &str) -> String {
    join([read_dir(user).as_str(), key])
}

/// Directory holding subscriber markers for a thread, or for the whole
/// repository when `thread` is repo-scoped
pub fn subscribers_dir(thread: &ThreadRef) -> String {
    let repo_dir = escape(thread.repo.as_str(), &[]);
    if thread.is_repo_scope() {
        join([SUBSCRIBERS_DIR, repo_dir.as_str()])
    } else {
        let thread_dir = format!(
            "{THREAD_DIR_PREFIX}{}-{}",
            encode_thread_type(&thread.thread_type),
            thread.thread_id
        );
        join([SUBSCRIBERS_DIR, repo_dir.as_str(), thread_dir.as_str()])
    }
}

pub fn subscriber_path(thread: &ThreadRef, subscriber: &UserSpec) -> String {
    join([subscribers_dir(thread), user_segment(subscriber)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(uri: &str) -> RepoSpec {
        RepoSpec::new(uri).unwrap()
    }

    #[test]
    fn test_common_key_is_readable() {
        let thread = ThreadRef::new(repo("github.com/user/repo"), "issues", 1);
        assert_eq!(notification_key(&thread), "github.com-user-repo-issues-1");
        assert_eq!(parse_notification_key("github.com-user-repo-issues-1").unwrap(), thread);
    }

    #[test]
    fn test_keys_do_not_collide_on_dashes() {
        // Naive dash joining would encode all three as "a-b-c-1"
        let slash = ThreadRef::new(repo("a/b"), "c", 1);
        let dash = ThreadRef::new(repo("a-b"), "c", 1);
        let in_type = ThreadRef::new(repo("a"), "b-c", 1);

        let keys = [
            notification_key(&slash),
            notification_key(&dash),
            notification_key(&in_type),
        ];
        assert_eq!(keys[0], "a-b-c-1");
        assert_eq!(keys[1], "a%2Db-c-1");
        assert_eq!(keys[2], "a-b%2Dc-1");

        assert_eq!(parse_notification_key(&keys[0]).unwrap(), slash);
        assert_eq!(parse_notification_key(&keys[1]).unwrap(), dash);
        assert_eq!(parse_notification_key(&keys[2]).unwrap(), in_type);
    }

    #[test]
    fn test_key_with_odd_thread_types() {
        for thread_type in ["", "pull/request", "100%", "x-1"] {
            let thread = ThreadRef::new(repo("host/o/r"), thread_type, 42);
            let key = notification_key(&thread);
            assert!(!key.contains('/'), "key {key:?} must be a single segment");
            assert_eq!(parse_notification_key(&key).unwrap(), thread);
        }
    }

    #[test]
    fn test_parse_key_rejects_malformed() {
        for bad in [
            "",
            "noseparators",
            "repo-issues-",
            "repo-issues-x1",
            "repo-issues-+1",
            "repo-issues-01",
            "repo-is%2dsues-1",
            "repo-is%zzsues-1",
            "-issues-1",
            "a--b-issues-1",
        ] {
            assert!(
                matches!(parse_notification_key(bad), Err(Error::InvalidKey { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_user_segment_round_trip() {
        let plain = UserSpec::new(1, "example.org");
        assert_eq!(user_segment(&plain), "1@example.org");
        assert_eq!(parse_user_segment("1@example.org").unwrap(), plain);

        let slashy = UserSpec::new(2, "git.example.org/realm");
        let seg = user_segment(&slashy);
        assert_eq!(seg, "2@git.example.org%2Frealm");
        assert_eq!(parse_user_segment(&seg).unwrap(), slashy);

        assert!(parse_user_segment("not-a-user").is_err());
    }

    #[test]
    fn test_paths() {
        let user = UserSpec::new(1, "example.org");
        let thread = ThreadRef::new(repo("github.com/user/repo"), "issues", 7);
        let key = notification_key(&thread);

        assert_eq!(notifications_dir(&user), "notifications/1@example.org");
        assert_eq!(
            notification_path(&user, &key),
            "notifications/1@example.org/github.com-user-repo-issues-7"
        );
        assert_eq!(read_path(&user, &key), "read/1@example.org/github.com-user-repo-issues-7");
        assert_eq!(
            subscriber_path(&thread, &user),
            "subscribers/github.com/user/repo/%Tissues-7/1@example.org"
        );
        assert_eq!(
            subscriber_path(&ThreadRef::repo_scope(thread.repo.clone()), &user),
            "subscribers/github.com/user/repo/1@example.org"
        );
    }

    #[test]
    fn test_thread_dirs_never_collide_with_repo_dirs() {
        let thread = ThreadRef::new(repo("a"), "issues", 1);
        let lookalike = ThreadRef::repo_scope(repo("a/issues-1"));
        assert_ne!(subscribers_dir(&thread), subscribers_dir(&lookalike));

        // A repo segment spelled like the thread prefix is escaped
        let spoof = ThreadRef::repo_scope(repo("a/%Tissues-1"));
        assert_eq!(subscribers_dir(&spoof), "subscribers/a/%25Tissues-1");
        assert_ne!(subscribers_dir(&thread), subscribers_dir(&spoof));
    }
}
