//! # Path type
//!
//! A normalized, absolute, POSIX-style path made of owned string components.
//!
//! ## Responsibility
//! - Total construction from any string (never fails, purely lexical)
//! - Normalization: collapse `.` and empty segments, resolve `..` against
//!   the parent component sequence (never above the root)
//! - Hashing, ordering, and `/`-joining without touching any filesystem
//!
//! `UfsPath` never looks at a filesystem. Resolving symlinks, checking
//! existence, or anything else that requires a backend belongs to the
//! backend's own `info`/`ls` calls, not to this type.

use std::fmt;
use std::path::{Path, PathBuf};

/// A normalized absolute POSIX-style path.
///
/// Two paths are equal iff their component sequences are equal. The parent
/// of the root is the root itself.
///
/// # Example
///
/// ```rust
/// use ufs::UfsPath;
///
/// let p = UfsPath::new("/a/./b/../c");
/// assert_eq!(p.to_string(), "/a/c");
///
/// let root = UfsPath::root();
/// assert_eq!(root.parent(), root);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UfsPath {
    /// Normalized path components, root excluded (root is the empty vec).
    parts: Vec<String>,
}

impl UfsPath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self { parts: Vec::new() }
    }

    /// Build a normalized path from any string-like input.
    ///
    /// Construction is total: `.`/empty segments are dropped, `..` pops the
    /// last component if one exists and is otherwise swallowed (never
    /// escapes above the root).
    pub fn new(raw: impl AsRef<str>) -> Self {
        let mut parts = Vec::new();
        for seg in raw.as_ref().split('/') {
            match seg {
                "" | "." => continue,
                ".." => {
                    parts.pop();
                }
                other => parts.push(other.to_string()),
            }
        }
        Self { parts }
    }

    /// Build a path directly from already-normalized components.
    pub fn from_parts(parts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut path = Self::root();
        for p in parts {
            let s = p.into();
            match s.as_str() {
                "" | "." => continue,
                ".." => {
                    path.parts.pop();
                }
                _ => path.parts.push(s),
            }
        }
        path
    }

    /// `true` iff this is the root path.
    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    /// The final component's name, if any (the root has none).
    pub fn name(&self) -> Option<&str> {
        self.parts.last().map(String::as_str)
    }

    /// The normalized component sequence.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// The parent path. The parent of the root is the root.
    pub fn parent(&self) -> UfsPath {
        if self.parts.is_empty() {
            self.clone()
        } else {
            UfsPath {
                parts: self.parts[..self.parts.len() - 1].to_vec(),
            }
        }
    }

    /// Join another (possibly relative) path onto this one.
    pub fn join(&self, other: impl AsRef<str>) -> UfsPath {
        let mut parts = self.parts.clone();
        for seg in other.as_ref().split('/') {
            match seg {
                "" | "." => continue,
                ".." => {
                    parts.pop();
                }
                s => parts.push(s.to_string()),
            }
        }
        UfsPath { parts }
    }

    /// Join a single already-normalized component.
    pub fn join_name(&self, name: impl Into<String>) -> UfsPath {
        let mut parts = self.parts.clone();
        parts.push(name.into());
        UfsPath { parts }
    }

    /// `true` iff `self` is `other` or a descendant of `other`.
    pub fn starts_with(&self, other: &UfsPath) -> bool {
        self.parts.len() >= other.parts.len() && self.parts[..other.parts.len()] == other.parts[..]
    }

    /// The remainder of `self` after stripping the `prefix` components.
    ///
    /// Returns `None` if `self` does not start with `prefix`.
    pub fn strip_prefix(&self, prefix: &UfsPath) -> Option<UfsPath> {
        if !self.starts_with(prefix) {
            return None;
        }
        Some(UfsPath {
            parts: self.parts[prefix.parts.len()..].to_vec(),
        })
    }

    /// The path rendered as a `PathBuf` relative to a given root, for
    /// backends that delegate to the host filesystem.
    pub fn to_host_path(&self, root: &Path) -> PathBuf {
        let mut buf = root.to_path_buf();
        for part in &self.parts {
            buf.push(part);
        }
        buf
    }
}

impl fmt::Display for UfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parts.is_empty() {
            write!(f, "/")
        } else {
            for part in &self.parts {
                write!(f, "/{part}")?;
            }
            Ok(())
        }
    }
}

impl From<&str> for UfsPath {
    fn from(s: &str) -> Self {
        UfsPath::new(s)
    }
}

impl From<String> for UfsPath {
    fn from(s: String) -> Self {
        UfsPath::new(s)
    }
}

impl std::str::FromStr for UfsPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(UfsPath::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dot_and_empty_segments() {
        assert_eq!(UfsPath::new("/a//b/./c").to_string(), "/a/b/c");
    }

    #[test]
    fn resolves_dotdot_within_path() {
        assert_eq!(UfsPath::new("/a/b/../c").to_string(), "/a/c");
    }

    #[test]
    fn dotdot_never_escapes_root() {
        assert_eq!(UfsPath::new("/../../a").to_string(), "/a");
        assert_eq!(UfsPath::root().parent(), UfsPath::root());
    }

    #[test]
    fn equality_is_by_components() {
        assert_eq!(UfsPath::new("/a/b"), UfsPath::new("/a/./b/"));
    }

    #[test]
    fn ordering_is_lexical_by_components() {
        assert!(UfsPath::new("/a") < UfsPath::new("/b"));
    }

    #[test]
    fn name_and_parent() {
        let p = UfsPath::new("/a/b/c");
        assert_eq!(p.name(), Some("c"));
        assert_eq!(p.parent(), UfsPath::new("/a/b"));
    }

    #[test]
    fn join_and_join_name() {
        let p = UfsPath::new("/a");
        assert_eq!(p.join("b/c"), UfsPath::new("/a/b/c"));
        assert_eq!(p.join_name("b"), UfsPath::new("/a/b"));
    }

    #[test]
    fn starts_with_and_strip_prefix() {
        let p = UfsPath::new("/a/b/c");
        let prefix = UfsPath::new("/a/b");
        assert!(p.starts_with(&prefix));
        assert_eq!(p.strip_prefix(&prefix), Some(UfsPath::new("/c")));
        assert_eq!(UfsPath::new("/x").strip_prefix(&prefix), None);
    }

    #[test]
    fn root_has_no_name_and_is_its_own_parent() {
        let root = UfsPath::root();
        assert_eq!(root.name(), None);
        assert_eq!(root.parent(), root);
    }
}
