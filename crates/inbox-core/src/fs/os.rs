//! Local-disk hierarchical store

use super::{check_cancel, segments, DirEntry, FileSystem, FsError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// Directory under the root where new file contents are staged before the
/// final rename. Hidden from root listings.
const STAGING_DIR: &str = ".staging";

/// A store rooted at a directory on local disk
///
/// File writes go to a staging file first, are fsynced, and are then
/// renamed into place, so readers never observe a partially written record.
#[derive(Debug)]
pub struct OsFs {
    root: PathBuf,
    counter: AtomicU64,
}

impl OsFs {
    /// Open a store rooted at `root`, creating the directory if missing
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root.display().to_string(), e))?;
        Ok(Self {
            root,
            counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        let mut full = self.root.clone();
        for seg in segments(path)? {
            full.push(seg);
        }
        Ok(full)
    }

    fn staging_path(&self) -> Result<PathBuf, FsError> {
        let dir = self.root.join(STAGING_DIR);
        fs::create_dir_all(&dir).map_err(|e| io_error(STAGING_DIR, e))?;
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(dir.join(format!("{}-{n}.tmp", std::process::id())))
    }
}

fn io_error(path: &str, source: std::io::Error) -> FsError {
    let path = path.to_string();
    match source.kind() {
        ErrorKind::NotFound => FsError::NotFound { path },
        ErrorKind::AlreadyExists => FsError::AlreadyExists { path },
        ErrorKind::NotADirectory => FsError::NotADirectory { path },
        ErrorKind::IsADirectory => FsError::IsADirectory { path },
        _ => FsError::Io { path, source },
    }
}

fn entry_from_metadata(name: String, meta: &fs::Metadata) -> DirEntry {
    DirEntry {
        name,
        is_dir: meta.is_dir(),
        len: if meta.is_dir() { 0 } else { meta.len() },
    }
}

impl FileSystem for OsFs {
    fn mkdir(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError> {
        check_cancel(cancel)?;
        let full = self.resolve(path)?;
        fs::create_dir(&full).map_err(|e| io_error(path, e))
    }

    fn mkdir_all(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError> {
        check_cancel(cancel)?;
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|e| io_error(path, e))
    }

    fn read_dir(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<DirEntry>, FsError> {
        check_cancel(cancel)?;
        let full = self.resolve(path)?;
        let at_root = path.is_empty();
        let mut entries = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| io_error(path, e))? {
            let entry = entry.map_err(|e| io_error(path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if at_root && name == STAGING_DIR {
                continue;
            }
            let meta = entry.metadata().map_err(|e| io_error(path, e))?;
            entries.push(entry_from_metadata(name, &meta));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<u8>, FsError> {
        check_cancel(cancel)?;
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|e| io_error(path, e))
    }

    fn write_file(
        &self,
        cancel: &CancellationToken,
        path: &str,
        data: &[u8],
    ) -> Result<(), FsError> {
        check_cancel(cancel)?;
        let full = self.resolve(path)?;
        if path.is_empty() {
            return Err(FsError::IsADirectory {
                path: path.to_string(),
            });
        }
        match full.parent().map(fs::metadata) {
            Some(Ok(meta)) if meta.is_dir() => {}
            Some(Ok(_)) => {
                return Err(FsError::NotADirectory {
                    path: path.to_string(),
                });
            }
            Some(Err(e)) => return Err(io_error(path, e)),
            None => {}
        }
        if full.is_dir() {
            return Err(FsError::IsADirectory {
                path: path.to_string(),
            });
        }

        // Write to a staging file with fsync, then rename into place
        let tmp_path = self.staging_path()?;
        let staged = (|| -> std::io::Result<()> {
            let mut tmp_file = fs::File::create(&tmp_path)?;
            tmp_file.write_all(data)?;
            tmp_file.sync_all()
        })();
        if let Err(e) = staged {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_error(path, e));
        }
        fs::rename(&tmp_path, &full).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_error(path, e)
        })
    }

    fn stat(&self, cancel: &CancellationToken, path: &str) -> Result<DirEntry, FsError> {
        check_cancel(cancel)?;
        let full = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| io_error(path, e))?;
        let name = path.rsplit('/').next().unwrap_or("").to_string();
        Ok(entry_from_metadata(name, &meta))
    }

    fn remove_all(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError> {
        check_cancel(cancel)?;
        if path.is_empty() {
            return Err(FsError::InvalidPath {
                path: path.to_string(),
            });
        }
        let full = self.resolve(path)?;
        let meta = fs::symlink_metadata(&full).map_err(|e| io_error(path, e))?;
        if meta.is_dir() {
            fs::remove_dir_all(&full).map_err(|e| io_error(path, e))
        } else {
            fs::remove_file(&full).map_err(|e| io_error(path, e))
        }
    }

    fn rename(&self, cancel: &CancellationToken, from: &str, to: &str) -> Result<(), FsError> {
        check_cancel(cancel)?;
        for path in [from, to] {
            if path.is_empty() {
                return Err(FsError::InvalidPath {
                    path: path.to_string(),
                });
            }
        }
        let from_full = self.resolve(from)?;
        let to_full = self.resolve(to)?;
        // Surface a missing source as NotFound rather than a generic error
        fs::symlink_metadata(&from_full).map_err(|e| io_error(from, e))?;
        fs::rename(&from_full, &to_full).map_err(|e| io_error(to, e))
    }
}
