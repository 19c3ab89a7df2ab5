//! # `LocalUfs` — the host filesystem
//!
//! Delegates every operation to `std::fs`/`std::io`, rooted at a directory
//! given at construction. Handles are backed by real `std::fs::File`s kept
//! in a table keyed the same way as [`crate::handle::HandleTable`], since
//! `File` itself isn't `Clone` and can't live in a `DashMap<UfsPath, _>`
//! alongside directory bookkeeping the way `MemoryUfs` does.

use std::fs::{self, File, OpenOptions};
use std::io::{Read as _, Seek as _, SeekFrom, Write as _};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::contract::Ufs;
use crate::error::FsError;
use crate::handle::FIRST_HANDLE;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, OpenMode, Whence};

/// A filesystem rooted at a host directory.
///
/// [`Ufs::scope`] reports [`AccessScope::System`]: handles and paths are
/// meaningful to any process on the same host, but not across hosts.
#[derive(Debug)]
pub struct LocalUfs {
    root: PathBuf,
    next_id: AtomicU64,
    handles: DashMap<u64, File>,
}

impl LocalUfs {
    /// Root the store at `root`, which must already exist as a directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            next_id: AtomicU64::new(FIRST_HANDLE),
            handles: DashMap::new(),
        }
    }

    fn host_path(&self, path: &UfsPath) -> PathBuf {
        path.to_host_path(&self.root)
    }

    /// The host directory this store is rooted at, rendered as a `String`
    /// for a [`crate::descriptor::StoreDescriptor::Local`].
    pub fn root_display(&self) -> String {
        self.root.display().to_string()
    }

    fn with_file<R>(&self, handle: u64, f: impl FnOnce(&mut File) -> std::io::Result<R>) -> Result<R, FsError> {
        let mut entry = self.handles.get_mut(&handle).ok_or_else(|| FsError::bad_handle(handle))?;
        f(&mut entry).map_err(FsError::from)
    }
}

impl Ufs for LocalUfs {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        let host = self.host_path(path);
        let read_dir = fs::read_dir(&host).map_err(|e| map_io(e, path))?;
        let mut names = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(FsError::from)?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        let host = self.host_path(path);
        let meta = fs::metadata(&host).map_err(|e| map_io(e, path))?;
        let to_secs = |t: std::io::Result<std::time::SystemTime>| {
            t.ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64())
        };
        Ok(FileStat {
            ty: if meta.is_dir() {
                crate::stat::EntryType::Directory
            } else {
                crate::stat::EntryType::File
            },
            size: if meta.is_dir() { 0 } else { meta.len() },
            atime: to_secs(meta.accessed()),
            ctime: None,
            mtime: to_secs(meta.modified()),
            extra: Default::default(),
        })
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        let _ = size_hint;
        let host = self.host_path(path);
        let mut opts = OpenOptions::new();
        match mode.kind {
            OpenMode::Read => {
                opts.read(true);
                if mode.updating {
                    opts.write(true);
                }
            }
            OpenMode::Write => {
                opts.write(true).create(true).truncate(true);
                if mode.updating {
                    opts.read(true);
                }
            }
            OpenMode::Append => {
                opts.append(true).create(true);
                if mode.updating {
                    opts.read(true);
                }
            }
        }
        let file = opts.open(&host).map_err(|e| map_io(e, path))?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handles.insert(id, file);
        Ok(id)
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        let from = match whence {
            Whence::Start => SeekFrom::Start(pos.max(0) as u64),
            Whence::Current => SeekFrom::Current(pos),
            Whence::End => SeekFrom::End(pos),
        };
        self.with_file(handle, |f| f.seek(from))
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        self.with_file(handle, |f| {
            let mut buf = vec![0u8; n];
            let read = f.read(&mut buf)?;
            buf.truncate(read);
            Ok(buf)
        })
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        self.with_file(handle, |f| f.write(data))
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        self.with_file(handle, |f| f.set_len(len))
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        self.handles
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| FsError::bad_handle(handle))
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        fs::remove_file(self.host_path(path)).map_err(|e| map_io(e, path))
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        fs::create_dir(self.host_path(path)).map_err(|e| map_io(e, path))
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        fs::remove_dir(self.host_path(path)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::DirectoryNotEmpty {
                FsError::NotEmpty { path: path.clone() }
            } else {
                map_io(e, path)
            }
        })
    }

    fn flush(&self, handle: u64) -> Result<(), FsError> {
        self.with_file(handle, |f| f.flush())
    }

    fn scope(&self) -> AccessScope {
        AccessScope::System
    }
}

fn map_io(err: std::io::Error, path: &UfsPath) -> FsError {
    match err.kind() {
        std::io::ErrorKind::NotFound => FsError::NotFound { path: path.clone() },
        std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists { path: path.clone() },
        std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied {
            path: Some(path.clone()),
        },
        _ => FsError::io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_put_cat() {
        let dir = tempdir().unwrap();
        let fs = LocalUfs::new(dir.path());
        let path = UfsPath::new("/hello.txt");
        fs.put(&path, b"hi there").unwrap();
        assert_eq!(fs.cat(&path).unwrap(), b"hi there");
    }

    #[test]
    fn mkdir_ls_rmdir() {
        let dir = tempdir().unwrap();
        let fs = LocalUfs::new(dir.path());
        fs.mkdir(&UfsPath::new("/sub")).unwrap();
        fs.put(&UfsPath::new("/sub/a.txt"), b"x").unwrap();
        assert_eq!(fs.ls(&UfsPath::new("/sub")).unwrap(), vec!["a.txt"]);
        fs.unlink(&UfsPath::new("/sub/a.txt")).unwrap();
        fs.rmdir(&UfsPath::new("/sub")).unwrap();
        assert!(fs.info(&UfsPath::new("/sub")).is_err());
    }

    #[test]
    fn scope_is_system() {
        let dir = tempdir().unwrap();
        assert_eq!(LocalUfs::new(dir.path()).scope(), AccessScope::System);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let fs = LocalUfs::new(dir.path());
        assert!(matches!(
            fs.open(&UfsPath::new("/nope.txt"), Mode::READ, None),
            Err(FsError::NotFound { .. })
        ));
    }
}
