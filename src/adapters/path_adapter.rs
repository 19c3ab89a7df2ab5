//! # `PathAdapter` — a `pathlib`-shaped handle onto one location
//!
//! Pairs a store with a single [`UfsPath`] the way `pathlib.Path` pairs a
//! path string with the ambient filesystem, so callers can pass one value
//! around instead of threading `(&dyn Ufs, &UfsPath)` everywhere. Text
//! helpers assume UTF-8 — there is no `encoding_rs` dependency in this
//! crate, so `read_text`/`write_text` simply round-trip through
//! `String::from_utf8`/`as_bytes` and surface anything else as `FsError::Io`.

use std::sync::Arc;

use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::FileStat;

/// A store paired with one path within it.
#[derive(Clone)]
pub struct PathAdapter {
    store: Arc<dyn Ufs>,
    path: UfsPath,
}

impl PathAdapter {
    /// Pair `store` with `path`.
    pub fn new(store: Arc<dyn Ufs>, path: UfsPath) -> Self {
        Self { store, path }
    }

    /// The underlying path.
    pub fn path(&self) -> &UfsPath {
        &self.path
    }

    /// A new adapter for `name` joined onto this path.
    pub fn join(&self, name: impl Into<String>) -> PathAdapter {
        PathAdapter {
            store: self.store.clone(),
            path: self.path.join_name(name),
        }
    }

    /// The parent of this path, on the same store.
    pub fn parent(&self) -> PathAdapter {
        PathAdapter {
            store: self.store.clone(),
            path: self.path.parent(),
        }
    }

    /// Stat this path.
    pub fn stat(&self) -> Result<FileStat, FsError> {
        self.store.info(&self.path)
    }

    /// `true` iff this path exists.
    pub fn exists(&self) -> bool {
        self.store.info(&self.path).is_ok()
    }

    /// `true` iff this path exists and is a regular file.
    pub fn is_file(&self) -> bool {
        self.store.info(&self.path).map(|s| s.is_file()).unwrap_or(false)
    }

    /// `true` iff this path exists and is a directory.
    pub fn is_dir(&self) -> bool {
        self.store.info(&self.path).map(|s| s.is_dir()).unwrap_or(false)
    }

    /// The names of this directory's immediate children.
    pub fn list(&self) -> Result<Vec<String>, FsError> {
        self.store.ls(&self.path)
    }

    /// Child paths, one [`PathAdapter`] per entry returned by [`Self::list`].
    pub fn iterdir(&self) -> Result<Vec<PathAdapter>, FsError> {
        Ok(self.list()?.into_iter().map(|name| self.join(name)).collect())
    }

    /// Read this path's full contents.
    pub fn read_bytes(&self) -> Result<Vec<u8>, FsError> {
        self.store.cat(&self.path)
    }

    /// Write this path's full contents, replacing anything already there.
    pub fn write_bytes(&self, data: &[u8]) -> Result<(), FsError> {
        self.store.put(&self.path, data)
    }

    /// Read this path's contents as UTF-8 text.
    pub fn read_text(&self) -> Result<String, FsError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(FsError::io)
    }

    /// Write `text` as this path's full contents.
    pub fn write_text(&self, text: &str) -> Result<(), FsError> {
        self.write_bytes(text.as_bytes())
    }

    /// Create this path as a directory.
    pub fn mkdir(&self) -> Result<(), FsError> {
        self.store.mkdir(&self.path)
    }

    /// Remove this path as a file.
    pub fn unlink(&self) -> Result<(), FsError> {
        self.store.unlink(&self.path)
    }

    /// Remove this path as an empty directory.
    pub fn rmdir(&self) -> Result<(), FsError> {
        self.store.rmdir(&self.path)
    }
}

impl std::fmt::Debug for PathAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathAdapter").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    fn store() -> Arc<dyn Ufs> {
        Arc::new(MemoryUfs::new())
    }

    #[test]
    fn write_text_then_read_text_roundtrips() {
        let root = PathAdapter::new(store(), UfsPath::root());
        let file = root.join("greeting.txt");
        file.write_text("hello, world").unwrap();
        assert_eq!(file.read_text().unwrap(), "hello, world");
        assert!(file.is_file());
    }

    #[test]
    fn iterdir_lists_joined_children() {
        let root = PathAdapter::new(store(), UfsPath::root());
        root.join("sub").mkdir().unwrap();
        root.join("sub").join("a.txt").write_bytes(b"a").unwrap();
        let children = root.join("sub").iterdir().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].path(), &UfsPath::new("/sub/a.txt"));
    }

    #[test]
    fn parent_and_exists() {
        let root = PathAdapter::new(store(), UfsPath::root());
        let nested = root.join("a").join("b.txt");
        assert!(!nested.exists());
        assert_eq!(nested.parent().path(), &UfsPath::new("/a"));
    }
}
