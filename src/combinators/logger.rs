//! # `Logger` — structured tracing around a store
//!
//! Every mutating operation logs at `debug!`; reads log at `trace!`. Both
//! carry `path`/`handle` fields so a `tracing-subscriber` filter can
//! isolate one store's traffic out of a larger combinator tree.

use tracing::{debug, trace};

use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// Wraps `inner`, tracing every operation under `name`.
pub struct Logger<B> {
    inner: B,
    name: &'static str,
}

impl<B: Ufs> Logger<B> {
    /// Wrap `inner`, tagging log lines with `name`.
    pub fn new(inner: B, name: &'static str) -> Self {
        Self { inner, name }
    }
}

impl<B: Ufs> Ufs for Logger<B> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        trace!(store = self.name, %path, "ls");
        self.inner.ls(path)
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        trace!(store = self.name, %path, "info");
        self.inner.info(path)
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        let result = self.inner.open(path, mode, size_hint);
        debug!(store = self.name, %path, %mode, ok = result.is_ok(), "open");
        result
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        trace!(store = self.name, handle, pos, "seek");
        self.inner.seek(handle, pos, whence)
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        trace!(store = self.name, handle, n, "read");
        self.inner.read(handle, n)
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        debug!(store = self.name, handle, len = data.len(), "write");
        self.inner.write(handle, data)
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        debug!(store = self.name, handle, len, "truncate");
        self.inner.truncate(handle, len)
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        debug!(store = self.name, handle, "close");
        self.inner.close(handle)
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        debug!(store = self.name, %path, "unlink");
        self.inner.unlink(path)
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        debug!(store = self.name, %path, "mkdir");
        self.inner.mkdir(path)
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        debug!(store = self.name, %path, "rmdir");
        self.inner.rmdir(path)
    }

    fn flush(&self, handle: u64) -> Result<(), FsError> {
        trace!(store = self.name, handle, "flush");
        self.inner.flush(handle)
    }

    fn start(&self) -> Result<(), FsError> {
        debug!(store = self.name, "start");
        self.inner.start()
    }

    fn stop(&self) -> Result<(), FsError> {
        debug!(store = self.name, "stop");
        self.inner.stop()
    }

    fn scope(&self) -> AccessScope {
        self.inner.scope()
    }
}

/// A [`crate::layer::Layer`] that wraps a store with [`Logger`].
pub struct LoggerLayer {
    name: &'static str,
}

impl LoggerLayer {
    /// Tag log lines with `name`.
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl<B: Ufs> crate::layer::Layer<B> for LoggerLayer {
    type Store = Logger<B>;

    fn layer(self, store: B) -> Self::Store {
        Logger::new(store, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[test]
    fn passes_operations_through_unchanged() {
        let logged = Logger::new(MemoryUfs::new(), "test");
        let path = UfsPath::new("/a.txt");
        logged.put(&path, b"x").unwrap();
        assert_eq!(logged.cat(&path).unwrap(), b"x");
    }
}
