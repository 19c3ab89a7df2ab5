//! # `ReadWriteCache` — stage both reads and writes through scratch disk
//!
//! Like [`super::writecache::WriteCache`], but a file's bytes also stay in
//! the scratch directory after a write closes, so a subsequent read for
//! the same path is served from disk instead of refetching from `inner`.
//! `ls`/`info` always go straight to `inner`: only whole-file bytes are
//! cached here, not directory structure.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::ensure_parents;
use super::tempdir::TemporaryDirectory;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::handle::FIRST_HANDLE;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, OpenMode, Whence};

enum Entry {
    Read { handle: u64 },
    Write { handle: u64, path: UfsPath },
}

/// Caches whole-file bytes for both reads and writes through a scratch
/// directory.
pub struct ReadWriteCache<B> {
    inner: B,
    scratch: TemporaryDirectory,
    handles: DashMap<u64, Entry>,
    next_id: AtomicU64,
}

impl<B: Ufs> ReadWriteCache<B> {
    /// Wrap `inner`, staging both directions through a fresh scratch
    /// directory.
    pub fn new(inner: B) -> Result<Self, FsError> {
        Ok(Self {
            inner,
            scratch: TemporaryDirectory::new()?,
            handles: DashMap::new(),
            next_id: AtomicU64::new(FIRST_HANDLE),
        })
    }

    fn populate_scratch(&self, path: &UfsPath, mode: Mode) -> Result<(), FsError> {
        if self.scratch.info(path).is_ok() {
            return Ok(());
        }
        if mode.kind == OpenMode::Write {
            // A plain write truncates on open regardless; nothing to
            // prefetch.
            return Ok(());
        }
        match self.inner.info(path) {
            Ok(stat) if stat.is_file() => {
                let data = self.inner.cat(path)?;
                ensure_parents(&self.scratch, path)?;
                self.scratch.put(path, &data)
            }
            Ok(_) => Ok(()),
            Err(FsError::NotFound { .. }) if mode.can_write() => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn alloc(&self, entry: Entry) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handles.insert(id, entry);
        id
    }
}

impl<B: Ufs> Ufs for ReadWriteCache<B> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.inner.ls(path)
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        self.inner.info(path)
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        ensure_parents(&self.scratch, path)?;
        self.populate_scratch(path, mode)?;
        let handle = self.scratch.open(path, mode, size_hint)?;
        if mode.can_write() {
            Ok(self.alloc(Entry::Write {
                handle,
                path: path.clone(),
            }))
        } else {
            Ok(self.alloc(Entry::Read { handle }))
        }
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        let inner_handle = match self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?.value() {
            Entry::Read { handle } | Entry::Write { handle, .. } => *handle,
        };
        self.scratch.seek(inner_handle, pos, whence)
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        let inner_handle = match self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?.value() {
            Entry::Read { handle } | Entry::Write { handle, .. } => *handle,
        };
        self.scratch.read(inner_handle, n)
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        let inner_handle = match self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?.value() {
            Entry::Write { handle, .. } => *handle,
            Entry::Read { .. } => {
                return Err(FsError::Unsupported {
                    operation: "write",
                    detail: "handle opened for reading".into(),
                })
            }
        };
        self.scratch.write(inner_handle, data)
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        let inner_handle = match self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?.value() {
            Entry::Read { handle } | Entry::Write { handle, .. } => *handle,
        };
        self.scratch.truncate(inner_handle, len)
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        let (_, entry) = self.handles.remove(&handle).ok_or_else(|| FsError::bad_handle(handle))?;
        match entry {
            Entry::Read { handle } => self.scratch.close(handle),
            Entry::Write { handle, path } => {
                self.scratch.close(handle)?;
                let data = self.scratch.cat(&path)?;
                ensure_parents(&self.inner, &path)?;
                self.inner.put(&path, &data)
            }
        }
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.unlink(path)?;
        let _ = self.scratch.unlink(path);
        Ok(())
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.mkdir(path)
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.inner.rmdir(path)?;
        let _ = self.scratch.rmdir(path);
        Ok(())
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
    fn read_after_write_serves_from_scratch() {
        let cached = ReadWriteCache::new(MemoryUfs::new()).unwrap();
        let path = UfsPath::new("/a.txt");
        cached.put(&path, b"hello").unwrap();
        assert_eq!(cached.inner.cat(&path).unwrap(), b"hello");
        assert_eq!(cached.cat(&path).unwrap(), b"hello");
    }

    #[test]
    fn first_read_populates_scratch_from_inner() {
        let cached = ReadWriteCache::new(MemoryUfs::new()).unwrap();
        let path = UfsPath::new("/a.txt");
        cached.inner.put(&path, b"from-inner").unwrap();
        assert_eq!(cached.cat(&path).unwrap(), b"from-inner");
        assert_eq!(cached.scratch.cat(&path).unwrap(), b"from-inner");
    }

    #[test]
    fn unlink_clears_both_sides() {
        let cached = ReadWriteCache::new(MemoryUfs::new()).unwrap();
        let path = UfsPath::new("/a.txt");
        cached.put(&path, b"x").unwrap();
        cached.unlink(&path).unwrap();
        assert!(cached.info(&path).is_err());
    }
}
