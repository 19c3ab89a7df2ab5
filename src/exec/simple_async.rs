//! # `SimpleAsync` — non-blocking sync stores, exposed as `AsyncUfs`
//!
//! For a sync [`Ufs`] backend that never actually blocks (e.g. `MemoryUfs`,
//! or a remote backend whose transport already does its own non-blocking
//! I/O under the hood), spinning up [`super::sync_to_async::SyncToAsync`]'s
//! dedicated thread is pure overhead. `SimpleAsync` calls straight through
//! with no suspension point of its own, documented as only correct for
//! backends that genuinely don't block the executor.

use async_trait::async_trait;

use crate::contract::asynch::AsyncUfs;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// Wraps a non-blocking sync [`Ufs`] and exposes it as [`AsyncUfs`] with no
/// thread or queue of its own.
pub struct SimpleAsync<B> {
    inner: B,
}

impl<B: Ufs> SimpleAsync<B> {
    /// Wrap `inner`. Only correct when `inner` never blocks the calling
    /// thread for any meaningful duration.
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<B: Ufs> AsyncUfs for SimpleAsync<B> {
    async fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.inner.ls(path)
    }

    async fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        self.inner.info(path)
    }

    async fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        self.inner.open(path, mode, size_hint)
    }

    async fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        self.inner.seek(handle, pos, whence)
    }

    async fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        self.inner.read(handle, n)
    }

    async fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        self.inner.write(handle, data)
    }

    async fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        self.inner.truncate(handle, len)
    }

    async fn close(&self, handle: u64) -> Result<(), FsError> {
        self.inner.close(handle)
    }

    async fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.unlink(path)
    }

    async fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.mkdir(path)
    }

    async fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.rmdir(path)
    }

    async fn flush(&self, handle: u64) -> Result<(), FsError> {
        self.inner.flush(handle)
    }

    async fn start(&self) -> Result<(), FsError> {
        self.inner.start()
    }

    async fn stop(&self) -> Result<(), FsError> {
        self.inner.stop()
    }

    fn scope(&self) -> AccessScope {
        self.inner.scope()
    }
}
