//! # The UFS contract — synchronous shape
//!
//! Every store (leaf backend or combinator) implements [`Ufs`]. The core
//! set (`ls`, `info`, `open`, `seek`, `read`, `write`, `truncate`, `close`,
//! `unlink`, `mkdir`, `rmdir`, `flush`, `start`, `stop`, `scope`) must be
//! provided; `cat`, `put`, `copy`, and `rename` have default
//! implementations derived from it (open+read-loop+close, etc.) that any
//! backend may override when it has a cheaper native path.

pub mod asynch;

use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// The chunk size used by the default `cat`/`put`/`copy` implementations.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// The synchronous UFS contract.
///
/// Implementors must be `Send + Sync`: methods take `&self`, and backends
/// use interior mutability (a `Mutex`/`DashMap`-guarded handle table, a
/// `RwLock`-guarded in-memory tree, ...) so that a store can be shared
/// behind an `Arc` and driven from multiple threads without an external
/// lock.
///
/// # Example
///
/// ```rust
/// use ufs::{Ufs, UfsPath, backends::MemoryUfs};
///
/// let fs = MemoryUfs::new();
/// fs.put(&UfsPath::new("/greeting.txt"), b"hello").unwrap();
/// assert_eq!(fs.cat(&UfsPath::new("/greeting.txt")).unwrap(), b"hello");
/// ```
pub trait Ufs: Send + Sync {
    /// List the names of a directory's immediate children.
    ///
    /// Defined iff `info(path)` reports a directory.
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError>;

    /// Stat a path. Defined iff the path exists.
    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError>;

    /// Open a handle onto `path` in the given `mode`.
    ///
    /// `size_hint`, when given, is a positive declared length passed on to
    /// backends that require one for single-shot uploads; streaming
    /// backends ignore it.
    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError>;

    /// Reposition a handle's cursor, returning the new absolute position.
    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError>;

    /// Read up to `n` bytes from a handle, advancing its cursor.
    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError>;

    /// Write bytes at a handle's cursor, returning the number written.
    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError>;

    /// Truncate (or extend) the file behind a handle to exactly `len` bytes.
    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError>;

    /// Close a handle, releasing its slot. Using the handle afterwards is
    /// an error.
    fn close(&self, handle: u64) -> Result<(), FsError>;

    /// Remove a file.
    fn unlink(&self, path: &UfsPath) -> Result<(), FsError>;

    /// Create a directory. Fails with `AlreadyExists` if it exists.
    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError>;

    /// Remove an empty directory. Fails with `NotEmpty` otherwise.
    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError>;

    /// Flush any buffered writes on a handle without closing it.
    fn flush(&self, handle: u64) -> Result<(), FsError> {
        let _ = handle;
        Ok(())
    }

    /// Bring up any resources (connections, worker threads) the store
    /// needs. Idempotent.
    fn start(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// Tear down resources brought up by `start`. Idempotent. Always
    /// releases scoped resources first, even when the store also wants to
    /// surface an error.
    fn stop(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// Which outer execution boundaries may safely share this store.
    fn scope(&self) -> AccessScope;

    /// Read an entire file. Default: `open` + read-loop + `close`.
    fn cat(&self, path: &UfsPath) -> Result<Vec<u8>, FsError> {
        let info = self.info(path)?;
        if !info.is_file() {
            return Err(FsError::IsADirectory { path: path.clone() });
        }
        let handle = self.open(path, Mode::READ, None)?;
        let mut buf = Vec::with_capacity(info.size as usize);
        loop {
            let chunk = self.read(handle, CHUNK_SIZE)?;
            if chunk.is_empty() {
                break;
            }
            buf.extend_from_slice(&chunk);
        }
        self.close(handle)?;
        Ok(buf)
    }

    /// Write an entire file. Default: `open("w")` + write-loop + `close`.
    fn put(&self, path: &UfsPath, data: &[u8]) -> Result<(), FsError> {
        let handle = self.open(path, Mode::WRITE, Some(data.len() as u64))?;
        let mut written = 0;
        while written < data.len() {
            let n = self.write(handle, &data[written..])?;
            if n == 0 {
                break;
            }
            written += n;
        }
        self.close(handle)?;
        Ok(())
    }

    /// Copy a file. Default: `cat` then `put`.
    fn copy(&self, src: &UfsPath, dst: &UfsPath) -> Result<(), FsError> {
        let data = self.cat(src)?;
        self.put(dst, &data)
    }

    /// Rename (move) a file within this store. Default: `copy` then
    /// `unlink` of the source.
    fn rename(&self, src: &UfsPath, dst: &UfsPath) -> Result<(), FsError> {
        self.copy(src, dst)?;
        self.unlink(src)
    }
}

impl Ufs for std::sync::Arc<dyn Ufs> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        (**self).ls(path)
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        (**self).info(path)
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        (**self).open(path, mode, size_hint)
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        (**self).seek(handle, pos, whence)
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        (**self).read(handle, n)
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        (**self).write(handle, data)
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        (**self).truncate(handle, len)
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        (**self).close(handle)
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        (**self).unlink(path)
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        (**self).mkdir(path)
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        (**self).rmdir(path)
    }

    fn flush(&self, handle: u64) -> Result<(), FsError> {
        (**self).flush(handle)
    }

    fn start(&self) -> Result<(), FsError> {
        (**self).start()
    }

    fn stop(&self) -> Result<(), FsError> {
        (**self).stop()
    }

    fn scope(&self) -> AccessScope {
        (**self).scope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[test]
    fn cat_put_roundtrip_via_defaults() {
        let fs = MemoryUfs::new();
        let path = UfsPath::new("/a.txt");
        fs.put(&path, b"hello world").unwrap();
        assert_eq!(fs.cat(&path).unwrap(), b"hello world");
        assert_eq!(fs.info(&path).unwrap().size, 11);
    }

    #[test]
    fn copy_then_rename_defaults() {
        let fs = MemoryUfs::new();
        let src = UfsPath::new("/src.txt");
        let dst = UfsPath::new("/dst.txt");
        fs.put(&src, b"payload").unwrap();
        fs.copy(&src, &dst).unwrap();
        assert_eq!(fs.cat(&dst).unwrap(), b"payload");
        assert!(fs.info(&src).is_ok());

        let dst2 = UfsPath::new("/dst2.txt");
        fs.rename(&dst, &dst2).unwrap();
        assert!(fs.info(&dst).is_err());
        assert_eq!(fs.cat(&dst2).unwrap(), b"payload");
    }

    #[test]
    fn arc_dyn_ufs_forwards_to_the_wrapped_store() {
        let fs: std::sync::Arc<dyn Ufs> = std::sync::Arc::new(MemoryUfs::new());
        let path = UfsPath::new("/a.txt");
        fs.put(&path, b"via arc").unwrap();
        assert_eq!(fs.cat(&path).unwrap(), b"via arc");
        assert_eq!(fs.scope(), AccessScope::Thread);
    }
}
