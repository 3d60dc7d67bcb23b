//! Path containment for everything derived from a request URL.
//!
//! Request paths are resolved purely lexically: joined against the served
//! root, `.`/`..` folded away, then checked with [`Path::starts_with`], which
//! compares whole components. That last point matters: `/data2/x` shares a
//! string prefix with `/data` but is not inside it.
//!
//! Symlinks inside the served tree are followed by the filesystem as usual;
//! the guard only rules out paths that *name* something outside the root.

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GuardError {
    /// The rejected path is deliberately not carried in the error.
    #[error("path escapes the served root")]
    PathEscape,
}

/// Absolute, normalized top of the browsable tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedRoot(PathBuf);

impl ServedRoot {
    /// Build from a user-supplied directory (relative to the working
    /// directory if not absolute). The directory must exist.
    pub fn new(dir: &Path) -> io::Result<Self> {
        let absolute = std::path::absolute(dir)?;
        let root = normalize(&absolute);
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self(root))
    }

    /// Wrap a path that is already absolute, without touching the filesystem.
    pub fn from_absolute(path: impl AsRef<Path>) -> Self {
        Self(normalize(path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Resolve a request path inside this root. See [`resolve`].
    pub fn resolve(&self, request_path: impl AsRef<Path>) -> Result<PathBuf, GuardError> {
        resolve(request_path.as_ref(), &self.0)
    }
}

/// Fold `.` and `..` components and collapse separators, without consulting
/// the filesystem. `..` above the filesystem root stays at the root; for
/// relative input it is kept, since there is nothing to fold it into.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Join `request_path` onto `root` and require the normalized result to stay
/// at or below `root`.
///
/// An absolute `request_path` is taken as-is, which is the form thumbnail and
/// original-file URLs carry (`/t/srv/photos/pic.jpg`).
pub fn resolve(request_path: &Path, root: &Path) -> Result<PathBuf, GuardError> {
    let candidate = normalize(&root.join(request_path));
    if candidate.starts_with(root) {
        Ok(candidate)
    } else {
        Err(GuardError::PathEscape)
    }
}
