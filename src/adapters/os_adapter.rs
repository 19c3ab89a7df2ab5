//! # `OsAdapter` — present a [`Ufs`] with POSIX errno semantics
//!
//! The seam every OS-facing surface (FUSE, SFTP) sits on: it re-expresses
//! [`FsError`] as [`nix::errno::Errno`] values the way [`crate::backends::LocalUfs`]
//! maps `std::io::Error` internally, but outward-facing instead of
//! backend-internal. Path and handle operations otherwise pass straight
//! through to the wrapped store.

#![cfg(feature = "fuse-mount")]

use nix::errno::Errno;

use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// Wraps any [`Ufs`] and re-expresses its errors as [`Errno`] for OS-facing
/// mount points and servers.
pub struct OsAdapter<B> {
    inner: B,
}

impl<B: Ufs> OsAdapter<B> {
    /// Wrap `inner`.
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// List a directory, mapping errors to [`Errno`].
    pub fn ls(&self, path: &UfsPath) -> Result<Vec<String>, Errno> {
        self.inner.ls(path).map_err(map_err)
    }

    /// Stat a path, mapping errors to [`Errno`].
    pub fn info(&self, path: &UfsPath) -> Result<FileStat, Errno> {
        self.inner.info(path).map_err(map_err)
    }

    /// Open a handle, mapping errors to [`Errno`].
    pub fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, Errno> {
        self.inner.open(path, mode, size_hint).map_err(map_err)
    }

    /// Reposition a handle's cursor, mapping errors to [`Errno`].
    pub fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, Errno> {
        self.inner.seek(handle, pos, whence).map_err(map_err)
    }

    /// Read from a handle, mapping errors to [`Errno`].
    pub fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, Errno> {
        self.inner.read(handle, n).map_err(map_err)
    }

    /// Write to a handle, mapping errors to [`Errno`].
    pub fn write(&self, handle: u64, data: &[u8]) -> Result<usize, Errno> {
        self.inner.write(handle, data).map_err(map_err)
    }

    /// Truncate a handle's file, mapping errors to [`Errno`].
    pub fn truncate(&self, handle: u64, len: u64) -> Result<(), Errno> {
        self.inner.truncate(handle, len).map_err(map_err)
    }

    /// Close a handle, mapping errors to [`Errno`].
    pub fn close(&self, handle: u64) -> Result<(), Errno> {
        self.inner.close(handle).map_err(map_err)
    }

    /// Remove a file, mapping errors to [`Errno`].
    pub fn unlink(&self, path: &UfsPath) -> Result<(), Errno> {
        self.inner.unlink(path).map_err(map_err)
    }

    /// Create a directory, mapping errors to [`Errno`].
    pub fn mkdir(&self, path: &UfsPath) -> Result<(), Errno> {
        self.inner.mkdir(path).map_err(map_err)
    }

    /// Remove an empty directory, mapping errors to [`Errno`].
    pub fn rmdir(&self, path: &UfsPath) -> Result<(), Errno> {
        self.inner.rmdir(path).map_err(map_err)
    }

    /// Which outer boundaries may safely share the wrapped store.
    pub fn scope(&self) -> AccessScope {
        self.inner.scope()
    }
}

/// Translate [`FsError`] into the nearest [`Errno`], the same spirit as
/// [`crate::backends::local`]'s private `map_io`, just in the other
/// direction. `Io` and any future non-exhaustive variant conservatively
/// map to `EROFS` rather than claiming a cause we don't know.
pub fn map_err(err: FsError) -> Errno {
    match err {
        FsError::NotFound { .. } => Errno::ENOENT,
        FsError::AlreadyExists { .. } => Errno::EEXIST,
        FsError::NotADirectory { .. } => Errno::ENOTDIR,
        FsError::IsADirectory { .. } => Errno::EISDIR,
        FsError::NotEmpty { .. } => Errno::ENOTEMPTY,
        FsError::PermissionDenied { .. } => Errno::EPERM,
        FsError::Unsupported { .. } => Errno::ENOTSUP,
        _ => Errno::EROFS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[test]
    fn missing_path_maps_to_enoent() {
        let adapter = OsAdapter::new(MemoryUfs::new());
        let err = adapter.info(&UfsPath::new("/missing")).unwrap_err();
        assert_eq!(err, Errno::ENOENT);
    }

    #[test]
    fn open_write_read_roundtrips_through_the_adapter() {
        let adapter = OsAdapter::new(MemoryUfs::new());
        let path = UfsPath::new("/a.txt");
        let handle = adapter.open(&path, Mode::WRITE, Some(5)).unwrap();
        assert_eq!(adapter.write(handle, b"hello").unwrap(), 5);
        adapter.close(handle).unwrap();
        let handle = adapter.open(&path, Mode::READ, None).unwrap();
        assert_eq!(adapter.read(handle, 64).unwrap(), b"hello");
        adapter.close(handle).unwrap();
    }

    #[test]
    fn rmdir_not_empty_maps_to_enotempty() {
        let adapter = OsAdapter::new(MemoryUfs::new());
        adapter.mkdir(&UfsPath::new("/dir")).unwrap();
        adapter.open(&UfsPath::new("/dir/a.txt"), Mode::WRITE, Some(0)).unwrap();
        let err = adapter.rmdir(&UfsPath::new("/dir")).unwrap_err();
        assert_eq!(err, Errno::ENOTEMPTY);
    }
}
