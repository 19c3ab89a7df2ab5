//! # `TemporaryDirectory` — scratch space on disk
//!
//! A [`LocalUfs`] rooted at a freshly created, process-unique temp
//! directory. The directory (and everything written under it) is removed
//! when the value is dropped. Used as the staging area for the write
//! caches (§4.7) and the FUSE fallback mirror (§4.11).

use std::path::Path;

use crate::backends::LocalUfs;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// An on-disk scratch store, removed on drop.
pub struct TemporaryDirectory {
    dir: tempfile::TempDir,
    inner: LocalUfs,
}

impl TemporaryDirectory {
    /// Create a fresh temporary directory under the OS default location.
    pub fn new() -> Result<Self, FsError> {
        let dir = tempfile::tempdir().map_err(FsError::from)?;
        let inner = LocalUfs::new(dir.path());
        Ok(Self { dir, inner })
    }

    /// The host filesystem path backing this store.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Ufs for TemporaryDirectory {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.inner.ls(path)
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        self.inner.info(path)
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        self.inner.open(path, mode, size_hint)
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
        self.inner.unlink(path)
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.mkdir(path)
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.rmdir(path)
    }

    fn flush(&self, handle: u64) -> Result<(), FsError> {
        self.inner.flush(handle)
    }

    fn scope(&self) -> AccessScope {
        AccessScope::System
    }
}
