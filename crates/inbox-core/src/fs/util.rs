//! Helpers layered over [`FileSystem`]
//!
//! "Already exists" and "not found" are treated as success wherever the
//! caller only cares about the end state.

use super::{DirEntry, FileSystem, FsError};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Parent of a logical path (`""` for top-level names)
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Join logical path segments with `/`
pub fn join<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(part);
    }
    out
}

/// Encode `value` as JSON into the file at `path`, creating or overwriting it
pub fn encode_json_file<F, T>(
    fs: &F,
    cancel: &CancellationToken,
    path: &str,
    value: &T,
) -> Result<()>
where
    F: FileSystem + ?Sized,
    T: Serialize,
{
    let data = serde_json::to_vec_pretty(value).map_err(|e| Error::Encoding {
        path: path.to_string(),
        source: e,
    })?;
    fs.write_file(cancel, path, &data)?;
    Ok(())
}

/// Decode the JSON contents of the file at `path`
pub fn decode_json_file<F, T>(fs: &F, cancel: &CancellationToken, path: &str) -> Result<T>
where
    F: FileSystem + ?Sized,
    T: DeserializeOwned,
{
    let data = fs.read_file(cancel, path)?;
    serde_json::from_slice(&data).map_err(|e| Error::Encoding {
        path: path.to_string(),
        source: e,
    })
}

/// Create an empty file at `path`, creating parent directories if needed
pub fn create_empty_file<F>(fs: &F, cancel: &CancellationToken, path: &str) -> Result<()>
where
    F: FileSystem + ?Sized,
{
    match fs.write_file(cancel, path, &[]) {
        Err(e) if e.is_not_found() => {
            fs.mkdir_all(cancel, parent(path))?;
            fs.write_file(cancel, path, &[])?;
            Ok(())
        }
        other => Ok(other?),
    }
}

/// Create a single directory, treating an existing one as success
///
/// A file already at `path` is reported as [`FsError::NotADirectory`].
pub fn ensure_dir<F>(fs: &F, cancel: &CancellationToken, path: &str) -> Result<()>
where
    F: FileSystem + ?Sized,
{
    match fs.mkdir(cancel, path) {
        Err(e) if e.is_already_exists() => {
            if fs.stat(cancel, path)?.is_dir {
                Ok(())
            } else {
                Err(FsError::NotADirectory {
                    path: path.to_string(),
                }
                .into())
            }
        }
        Err(e) if e.is_not_found() => {
            fs.mkdir_all(cancel, path)?;
            Ok(())
        }
        other => Ok(other?),
    }
}

/// List a directory, treating a missing one as empty
pub fn read_dir_or_empty<F>(
    fs: &F,
    cancel: &CancellationToken,
    path: &str,
) -> Result<Vec<DirEntry>>
where
    F: FileSystem + ?Sized,
{
    match fs.read_dir(cancel, path) {
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        other => Ok(other?),
    }
}

/// Remove a file or tree, treating a missing one as success
pub fn remove_if_present<F>(fs: &F, cancel: &CancellationToken, path: &str) -> Result<()>
where
    F: FileSystem + ?Sized,
{
    match fs.remove_all(cancel, path) {
        Err(e) if e.is_not_found() => Ok(()),
        other => Ok(other?),
    }
}

/// Remove a directory only if it has no children
///
/// Returns whether the directory was removed.
pub fn remove_dir_if_empty<F>(fs: &F, cancel: &CancellationToken, path: &str) -> Result<bool>
where
    F: FileSystem + ?Sized,
{
    match fs.read_dir(cancel, path) {
        Ok(entries) if entries.is_empty() => {
            remove_if_present(fs, cancel, path)?;
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Whether anything exists at `path`
pub fn exists<F>(fs: &F, cancel: &CancellationToken, path: &str) -> Result<bool>
where
    F: FileSystem + ?Sized,
{
    match fs.stat(cancel, path) {
        Ok(_) => Ok(true),
        Err(FsError::NotFound { .. }) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
