//! # `WriteCache` — stage writes through scratch disk
//!
//! Bytes written through this combinator land in a scratch
//! [`TemporaryDirectory`] first; the whole object is flushed to `inner`
//! with a single `put` when the handle closes. Useful in front of an
//! atomic (cat/put-only) remote backend where many small writes would
//! otherwise mean many whole-object round trips.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::tempdir::TemporaryDirectory;
use super::ensure_parents;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::handle::FIRST_HANDLE;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

enum Origin {
    /// A read handle, served directly from `inner`.
    Inner(u64),
    /// A write handle staged in `scratch`, flushed to `inner` on close.
    Scratch { handle: u64, path: UfsPath },
}

/// Stages writes to `inner` through a scratch directory.
pub struct WriteCache<B> {
    inner: B,
    scratch: TemporaryDirectory,
    handles: DashMap<u64, Origin>,
    next_id: AtomicU64,
}

impl<B: Ufs> WriteCache<B> {
    /// Wrap `inner`, staging writes through a fresh scratch directory.
    pub fn new(inner: B) -> Result<Self, FsError> {
        Ok(Self {
            inner,
            scratch: TemporaryDirectory::new()?,
            handles: DashMap::new(),
            next_id: AtomicU64::new(FIRST_HANDLE),
        })
    }

    fn alloc(&self, origin: Origin) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handles.insert(id, origin);
        id
    }
}

impl<B: Ufs> Ufs for WriteCache<B> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.inner.ls(path)
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        self.inner.info(path)
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        if mode.can_write() {
            ensure_parents(&self.scratch, path)?;
            let handle = self.scratch.open(path, mode, size_hint)?;
            return Ok(self.alloc(Origin::Scratch {
                handle,
                path: path.clone(),
            }));
        }
        let handle = self.inner.open(path, mode, size_hint)?;
        Ok(self.alloc(Origin::Inner(handle)))
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        match self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?.value() {
            Origin::Inner(h) => self.inner.seek(*h, pos, whence),
            Origin::Scratch { handle: h, .. } => self.scratch.seek(*h, pos, whence),
        }
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        match self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?.value() {
            Origin::Inner(h) => self.inner.read(*h, n),
            Origin::Scratch { handle: h, .. } => self.scratch.read(*h, n),
        }
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        match self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?.value() {
            Origin::Inner(_) => Err(FsError::Unsupported {
                operation: "write",
                detail: "handle opened for reading".into(),
            }),
            Origin::Scratch { handle: h, .. } => self.scratch.write(*h, data),
        }
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        match self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?.value() {
            Origin::Inner(h) => self.inner.truncate(*h, len),
            Origin::Scratch { handle: h, .. } => self.scratch.truncate(*h, len),
        }
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        let (_, origin) = self.handles.remove(&handle).ok_or_else(|| FsError::bad_handle(handle))?;
        match origin {
            Origin::Inner(h) => self.inner.close(h),
            Origin::Scratch { handle: h, path } => {
                self.scratch.close(h)?;
                let data = self.scratch.cat(&path)?;
                ensure_parents(&self.inner, &path)?;
                self.inner.put(&path, &data)?;
                self.scratch.unlink(&path)?;
                Ok(())
            }
        }
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

    fn scope(&self) -> AccessScope {
        self.inner.scope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[test]
    fn write_lands_only_after_close() {
        let cached = WriteCache::new(MemoryUfs::new()).unwrap();
        let path = UfsPath::new("/a.txt");
        let h = cached.open(&path, Mode::WRITE, None).unwrap();
        cached.write(h, b"staged").unwrap();
        assert!(cached.inner.info(&path).is_err());
        cached.close(h).unwrap();
        assert_eq!(cached.inner.cat(&path).unwrap(), b"staged");
    }

    #[test]
    fn nested_directory_writes_stage_correctly() {
        let cached = WriteCache::new(MemoryUfs::new()).unwrap();
        let path = UfsPath::new("/a/b/c.txt");
        let h = cached.open(&path, Mode::WRITE, None).unwrap();
        cached.write(h, b"deep").unwrap();
        cached.close(h).unwrap();
        assert_eq!(cached.cat(&path).unwrap(), b"deep");
    }

    #[test]
    fn reads_pass_through_to_inner() {
        let cached = WriteCache::new(MemoryUfs::new()).unwrap();
        let path = UfsPath::new("/a.txt");
        cached.inner.put(&path, b"direct").unwrap();
        assert_eq!(cached.cat(&path).unwrap(), b"direct");
    }
}
