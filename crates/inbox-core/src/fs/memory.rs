//! In-memory hierarchical store

use super::{check_cancel, segments, DirEntry, FileSystem, FsError};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Node {
    Dir(BTreeMap<String, Node>),
    File(Vec<u8>),
}

impl Node {
    fn empty_dir() -> Self {
        Node::Dir(BTreeMap::new())
    }

    fn entry(&self, name: &str) -> DirEntry {
        match self {
            Node::Dir(_) => DirEntry {
                name: name.to_string(),
                is_dir: true,
                len: 0,
            },
            Node::File(data) => DirEntry {
                name: name.to_string(),
                is_dir: false,
                len: data.len() as u64,
            },
        }
    }
}

/// A tree held entirely in memory
///
/// Contents are lost when the value is dropped. Share one instance between
/// a store and a test harness by wrapping it in an `Arc`.
#[derive(Debug)]
pub struct MemFs {
    root: Mutex<Node>,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFs {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Node::empty_dir()),
        }
    }

    fn with_root<R>(&self, f: impl FnOnce(&mut Node) -> R) -> R {
        let mut root = self.root.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut root)
    }
}

fn not_found(path: &str) -> FsError {
    FsError::NotFound {
        path: path.to_string(),
    }
}

fn lookup<'a>(root: &'a Node, segs: &[&str], path: &str) -> Result<&'a Node, FsError> {
    let mut node = root;
    for seg in segs {
        node = match node {
            Node::Dir(children) => children.get(*seg).ok_or_else(|| not_found(path))?,
            Node::File(_) => {
                return Err(FsError::NotADirectory {
                    path: path.to_string(),
                });
            }
        };
    }
    Ok(node)
}

fn dir_mut<'a>(
    root: &'a mut Node,
    segs: &[&str],
    path: &str,
) -> Result<&'a mut BTreeMap<String, Node>, FsError> {
    let mut node = root;
    for seg in segs {
        node = match node {
            Node::Dir(children) => children.get_mut(*seg).ok_or_else(|| not_found(path))?,
            Node::File(_) => {
                return Err(FsError::NotADirectory {
                    path: path.to_string(),
                });
            }
        };
    }
    match node {
        Node::Dir(children) => Ok(children),
        Node::File(_) => Err(FsError::NotADirectory {
            path: path.to_string(),
        }),
    }
}

/// Split into (parent segments, final name); the root has no name
fn split_last<'a>(segs: &'a [&'a str], path: &str) -> Result<(&'a [&'a str], &'a str), FsError> {
    match segs.split_last() {
        Some((name, parent)) => Ok((parent, *name)),
        None => Err(FsError::InvalidPath {
            path: path.to_string(),
        }),
    }
}

impl FileSystem for MemFs {
    fn mkdir(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError> {
        check_cancel(cancel)?;
        let segs = segments(path)?;
        if segs.is_empty() {
            return Err(FsError::AlreadyExists {
                path: path.to_string(),
            });
        }
        let (parent, name) = split_last(&segs, path)?;
        self.with_root(|root| {
            let children = dir_mut(root, parent, path)?;
            if children.contains_key(name) {
                return Err(FsError::AlreadyExists {
                    path: path.to_string(),
                });
            }
            children.insert(name.to_string(), Node::empty_dir());
            Ok(())
        })
    }

    fn mkdir_all(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError> {
        check_cancel(cancel)?;
        let segs = segments(path)?;
        self.with_root(|root| {
            let mut node = root;
            for seg in segs {
                node = match node {
                    Node::Dir(children) => children
                        .entry(seg.to_string())
                        .or_insert_with(Node::empty_dir),
                    Node::File(_) => {
                        return Err(FsError::NotADirectory {
                            path: path.to_string(),
                        });
                    }
                };
            }
            match node {
                Node::Dir(_) => Ok(()),
                Node::File(_) => Err(FsError::NotADirectory {
                    path: path.to_string(),
                }),
            }
        })
    }

    fn read_dir(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<DirEntry>, FsError> {
        check_cancel(cancel)?;
        let segs = segments(path)?;
        self.with_root(|root| match lookup(root, &segs, path)? {
            Node::Dir(children) => Ok(children
                .iter()
                .map(|(name, node)| node.entry(name))
                .collect()),
            Node::File(_) => Err(FsError::NotADirectory {
                path: path.to_string(),
            }),
        })
    }

    fn read_file(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<u8>, FsError> {
        check_cancel(cancel)?;
        let segs = segments(path)?;
        self.with_root(|root| match lookup(root, &segs, path)? {
            Node::File(data) => Ok(data.clone()),
            Node::Dir(_) => Err(FsError::IsADirectory {
                path: path.to_string(),
            }),
        })
    }

    fn write_file(
        &self,
        cancel: &CancellationToken,
        path: &str,
        data: &[u8],
    ) -> Result<(), FsError> {
        check_cancel(cancel)?;
        let segs = segments(path)?;
        let (parent, name) = split_last(&segs, path)?;
        self.with_root(|root| {
            let children = dir_mut(root, parent, path)?;
            if let Some(Node::Dir(_)) = children.get(name) {
                return Err(FsError::IsADirectory {
                    path: path.to_string(),
                });
            }
            children.insert(name.to_string(), Node::File(data.to_vec()));
            Ok(())
        })
    }

    fn stat(&self, cancel: &CancellationToken, path: &str) -> Result<DirEntry, FsError> {
        check_cancel(cancel)?;
        let segs = segments(path)?;
        let name = segs.last().copied().unwrap_or("");
        self.with_root(|root| Ok(lookup(root, &segs, path)?.entry(name)))
    }

    fn remove_all(&self, cancel: &CancellationToken, path: &str) -> Result<(), FsError> {
        check_cancel(cancel)?;
        let segs = segments(path)?;
        let (parent, name) = split_last(&segs, path)?;
        self.with_root(|root| {
            let children = dir_mut(root, parent, path)?;
            children.remove(name).map(|_| ()).ok_or_else(|| not_found(path))
        })
    }

    fn rename(&self, cancel: &CancellationToken, from: &str, to: &str) -> Result<(), FsError> {
        check_cancel(cancel)?;
        let from_segs = segments(from)?;
        let to_segs = segments(to)?;
        let (from_parent, from_name) = split_last(&from_segs, from)?;
        let (to_parent, to_name) = split_last(&to_segs, to)?;

        if from_segs == to_segs {
            return self.with_root(|root| lookup(root, &from_segs, from).map(|_| ()));
        }
        if to_segs.starts_with(&from_segs) {
            return Err(FsError::InvalidPath {
                path: to.to_string(),
            });
        }

        self.with_root(|root| {
            // Validate both ends before detaching the source node.
            let source_is_dir = matches!(lookup(root, &from_segs, from)?, Node::Dir(_));
            let target = dir_mut(root, to_parent, to)?;
            match target.get(to_name) {
                Some(Node::Dir(existing)) if !source_is_dir || !existing.is_empty() => {
                    return Err(FsError::IsADirectory {
                        path: to.to_string(),
                    });
                }
                Some(Node::File(_)) if source_is_dir => {
                    return Err(FsError::NotADirectory {
                        path: to.to_string(),
                    });
                }
                _ => {}
            }

            let node = dir_mut(root, from_parent, from)?
                .remove(from_name)
                .ok_or_else(|| not_found(from))?;
            dir_mut(root, to_parent, to)?.insert(to_name.to_string(), node);
            Ok(())
        })
    }
}
