//! Hierarchical store abstraction
//!
//! The notification store only needs a small tree API: directories, whole
//! files, recursive delete, and an atomic rename. Paths are logical,
//! `/`-separated and relative to the store root (e.g.
//! `notifications/1@example.org/repo-issues-1`).
//!
//! Every call takes the caller's [`CancellationToken`]; implementations
//! check it before touching storage and fail with [`FsError::Cancelled`].
//!
//! Two backends are provided:
//!
//! - [`MemFs`]: an in-memory tree, used in tests and ephemeral deployments
//! - [`OsFs`]: a directory on local disk, with crash-safe file writes

pub mod memory;
pub mod os;
pub mod util;

pub use memory::MemFs;
pub use os::OsFs;

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors reported by a [`FileSystem`]
#[derive(Error, Debug)]
pub enum FsError {
    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    #[error("invalid path: {path:?}")]
    InvalidPath { path: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl FsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, FsError::AlreadyExists { .. })
    }
}

/// A child of a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    /// File length in bytes (0 for directories)
    pub len: u64,
}

/// Tree-shaped storage consumed by the notification store
pub trait FileSystem: Send + Sync {
    /// Create a single directory; the parent must exist
    fn mkdir(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError>;

    /// Create a directory and any missing ancestors
    fn mkdir_all(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError>;

    /// List children of a directory, sorted by name
    fn read_dir(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<DirEntry>, FsError>;

    fn read_file(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<u8>, FsError>;

    /// Create or truncate a file; the parent directory must exist
    fn write_file(&self, cancel: &CancellationToken, path: &str, data: &[u8])
    -> Result<(), FsError>;

    fn stat(&self, cancel: &CancellationToken, path: &str) -> Result<DirEntry, FsError>;

    /// Remove a file or a directory tree
    fn remove_all(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError>;

    /// Atomically move `from` to `to`, replacing an existing file at `to`
    fn rename(&self, cancel: &CancellationToken, from: &str, to: &str) -> Result<(), FsError>;
}

impl<F: FileSystem + ?Sized> FileSystem for Arc<F> {
    fn mkdir(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError> {
        (**self).mkdir(cancel, path)
    }

    fn mkdir_all(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError> {
        (**self).mkdir_all(cancel, path)
    }

    fn read_dir(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<DirEntry>, FsError> {
        (**self).read_dir(cancel, path)
    }

    fn read_file(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<u8>, FsError> {
        (**self).read_file(cancel, path)
    }

    fn write_file(
        &self,
        cancel: &CancellationToken,
        path: &str,
        data: &[u8],
    ) -> Result<(), FsError> {
        (**self).write_file(cancel, path, data)
    }

    fn stat(&self, cancel: &CancellationToken, path: &str) -> Result<DirEntry, FsError> {
        (**self).stat(cancel, path)
    }

    fn remove_all(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError> {
        (**self).remove_all(cancel, path)
    }

    fn rename(&self, cancel: &CancellationToken, from: &str, to: &str) -> Result<(), FsError> {
        (**self).rename(cancel, from, to)
    }
}

/// Fail fast if the caller has given up
pub(crate) fn check_cancel(cancel: &CancellationToken) -> Result<(), FsError> {
    if cancel.is_cancelled() {
        Err(FsError::Cancelled)
    } else {
        Ok(())
    }
}

/// Split a logical path into validated segments
///
/// The empty path denotes the root and yields no segments.
pub(crate) fn segments(path: &str) -> Result<Vec<&str>, FsError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let segs: Vec<&str> = path.split('/').collect();
    if segs
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\') || s.contains('\0'))
    {
        return Err(FsError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(segs)
}
