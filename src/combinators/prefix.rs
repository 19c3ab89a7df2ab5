//! # `Prefix` — a single relocated subtree
//!
//! Mounts an inner store so its root appears at `mount_at` in outer path
//! space. Every operation strips `mount_at` off the outer path before
//! delegating; paths outside the prefix are `NotFound`. For routing
//! across several mount points, see [`super::mapper::Mapper`].

use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// Relocates `inner`'s root to `mount_at`.
pub struct Prefix<B> {
    inner: B,
    mount_at: UfsPath,
}

impl<B: Ufs> Prefix<B> {
    /// Mount `inner` at `mount_at`.
    pub fn new(inner: B, mount_at: impl Into<UfsPath>) -> Self {
        Self {
            inner,
            mount_at: mount_at.into(),
        }
    }

    fn translate(&self, path: &UfsPath) -> Result<UfsPath, FsError> {
        path.strip_prefix(&self.mount_at)
            .ok_or_else(|| FsError::NotFound { path: path.clone() })
    }
}

impl<B: Ufs> Ufs for Prefix<B> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.inner.ls(&self.translate(path)?)
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        self.inner.info(&self.translate(path)?)
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        self.inner.open(&self.translate(path)?, mode, size_hint)
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        self.inner.seek(handle, pos, whence)
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        self.inner.read(handle, n)
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        self.inner.write(handle, data)
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        self.inner.truncate(handle, len)
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        self.inner.close(handle)
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.unlink(&self.translate(path)?)
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.mkdir(&self.translate(path)?)
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.rmdir(&self.translate(path)?)
    }

    fn flush(&self, handle: u64) -> Result<(), FsError> {
        self.inner.flush(handle)
    }

    fn start(&self) -> Result<(), FsError> {
        self.inner.start()
    }

    fn stop(&self) -> Result<(), FsError> {
        self.inner.stop()
    }

    fn scope(&self) -> AccessScope {
        self.inner.scope()
    }
}

/// A [`crate::layer::Layer`] that mounts a store at a fixed prefix.
pub struct PrefixLayer {
    mount_at: UfsPath,
}

impl PrefixLayer {
    /// Mount at `mount_at`.
    pub fn new(mount_at: impl Into<UfsPath>) -> Self {
        Self {
            mount_at: mount_at.into(),
        }
    }
}

impl<B: Ufs> crate::layer::Layer<B> for PrefixLayer {
    type Store = Prefix<B>;

    fn layer(self, store: B) -> Self::Store {
        Prefix::new(store, self.mount_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[test]
    fn relocates_inner_root() {
        let inner = MemoryUfs::new();
        inner.put(&UfsPath::new("/hello.txt"), b"hi").unwrap();
        let prefixed = Prefix::new(inner, "/mnt/data");
        assert_eq!(prefixed.cat(&UfsPath::new("/mnt/data/hello.txt")).unwrap(), b"hi");
    }

    #[test]
    fn outside_prefix_is_not_found() {
        let prefixed = Prefix::new(MemoryUfs::new(), "/mnt/data");
        assert!(matches!(
            prefixed.info(&UfsPath::new("/elsewhere")),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn mount_point_itself_is_a_directory() {
        let prefixed = Prefix::new(MemoryUfs::new(), "/mnt/data");
        assert!(prefixed.info(&UfsPath::new("/mnt/data")).unwrap().is_dir());
    }
}
