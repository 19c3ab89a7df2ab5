//! # `MemoryUfs` — an in-process, in-memory store
//!
//! The reference leaf backend: every other store is exercised against it in
//! unit tests, and combinators use it as the simplest thing that could
//! possibly implement [`Ufs`].

use std::collections::BTreeSet;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::contract::Ufs;
use crate::error::FsError;
use crate::handle::{HandleEntry, HandleTable};
use crate::path::UfsPath;
use crate::stat::{AccessScope, EntryType, FileStat, Mode, OpenMode, Whence};

/// A single stored entry: a file's bytes, or a directory's marker.
#[derive(Debug, Clone)]
enum Inode {
    File(Vec<u8>),
    Directory,
}

/// An in-memory filesystem, backed by a `DashMap<UfsPath, Inode>` plus a
/// parallel `DashMap<UfsPath, BTreeSet<String>>` of each directory's
/// immediate children, so `ls` never has to scan the whole tree.
///
/// Not persisted; dropped with the process. [`Ufs::scope`] reports
/// [`AccessScope::Thread`] since nothing here is safe to hand to another
/// process.
#[derive(Debug)]
pub struct MemoryUfs {
    inodes: DashMap<UfsPath, Inode>,
    children: DashMap<UfsPath, BTreeSet<String>>,
    handles: HandleTable,
    // Serializes read-modify-write on a file's bytes across concurrent
    // writers; DashMap only guards a single insert, not the whole sequence.
    write_lock: Mutex<()>,
}

impl Default for MemoryUfs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUfs {
    /// A fresh, empty store containing only the root directory.
    pub fn new() -> Self {
        let children = DashMap::new();
        children.insert(UfsPath::root(), BTreeSet::new());
        let inodes = DashMap::new();
        inodes.insert(UfsPath::root(), Inode::Directory);
        Self {
            inodes,
            children,
            handles: HandleTable::new(),
            write_lock: Mutex::new(()),
        }
    }

    fn link(&self, path: &UfsPath) {
        if let Some(name) = path.name() {
            self.children
                .entry(path.parent())
                .or_default()
                .insert(name.to_string());
        }
    }

    fn unlink_name(&self, path: &UfsPath) {
        if let Some(name) = path.name() {
            if let Some(mut set) = self.children.get_mut(&path.parent()) {
                set.remove(name);
            }
        }
    }

    fn file_bytes(&self, path: &UfsPath) -> Result<Vec<u8>, FsError> {
        match self.inodes.get(path).map(|e| e.clone()) {
            Some(Inode::File(bytes)) => Ok(bytes),
            Some(Inode::Directory) => Err(FsError::IsADirectory { path: path.clone() }),
            None => Err(FsError::NotFound { path: path.clone() }),
        }
    }
}

impl Ufs for MemoryUfs {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        match self.inodes.get(path).map(|e| e.clone()) {
            Some(Inode::Directory) => Ok(self
                .children
                .get(path)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default()),
            Some(Inode::File(_)) => Err(FsError::NotADirectory { path: path.clone() }),
            None => Err(FsError::NotFound { path: path.clone() }),
        }
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        match self.inodes.get(path).map(|e| e.clone()) {
            Some(Inode::File(bytes)) => Ok(FileStat::file(bytes.len() as u64)),
            Some(Inode::Directory) => Ok(FileStat::directory()),
            None => Err(FsError::NotFound { path: path.clone() }),
        }
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        let _ = size_hint;
        match mode.kind {
            OpenMode::Read => {
                let bytes = self.file_bytes(path)?;
                let entry = HandleEntry::new(path.clone(), mode.kind, mode.updating, bytes.len() as u64);
                Ok(self.handles.insert(entry))
            }
            OpenMode::Write => {
                match self.inodes.get(path).map(|e| e.clone()) {
                    Some(Inode::Directory) => return Err(FsError::IsADirectory { path: path.clone() }),
                    _ => {}
                }
                self.inodes.insert(path.clone(), Inode::File(Vec::new()));
                self.link(path);
                let entry = HandleEntry::new(path.clone(), mode.kind, mode.updating, 0);
                Ok(self.handles.insert(entry))
            }
            OpenMode::Append => {
                let size = match self.inodes.get(path).map(|e| e.clone()) {
                    Some(Inode::File(bytes)) => bytes.len() as u64,
                    Some(Inode::Directory) => return Err(FsError::IsADirectory { path: path.clone() }),
                    None => {
                        self.inodes.insert(path.clone(), Inode::File(Vec::new()));
                        self.link(path);
                        0
                    }
                };
                let entry = HandleEntry::new(path.clone(), mode.kind, mode.updating, size);
                Ok(self.handles.insert(entry))
            }
        }
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        let entry = self.handles.get(handle).ok_or_else(|| FsError::bad_handle(handle))?;
        let len = self.file_bytes(&entry.path)?.len() as u64;
        let target = entry.seek_target(pos, whence, len);
        self.handles
            .with_mut(handle, |e| e.cursor = target)
            .ok_or_else(|| FsError::bad_handle(handle))?;
        Ok(target)
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        let entry = self.handles.get(handle).ok_or_else(|| FsError::bad_handle(handle))?;
        if entry.mode != OpenMode::Read && !entry.updating {
            return Err(FsError::Unsupported {
                operation: "read",
                detail: "handle not opened for reading".into(),
            });
        }
        let bytes = self.file_bytes(&entry.path)?;
        let start = (entry.cursor as usize).min(bytes.len());
        let end = (start + n).min(bytes.len());
        let chunk = bytes[start..end].to_vec();
        self.handles
            .with_mut(handle, |e| e.cursor = end as u64)
            .ok_or_else(|| FsError::bad_handle(handle))?;
        Ok(chunk)
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        let entry = self.handles.get(handle).ok_or_else(|| FsError::bad_handle(handle))?;
        if entry.mode == OpenMode::Read && !entry.updating {
            return Err(FsError::Unsupported {
                operation: "write",
                detail: "handle not opened for writing".into(),
            });
        }
        let _guard = self.write_lock.lock();
        let mut bytes = self.file_bytes(&entry.path)?;
        let start = entry.cursor as usize;
        if start > bytes.len() {
            bytes.resize(start, 0);
        }
        let end = start + data.len();
        if end > bytes.len() {
            bytes.resize(end, 0);
        }
        bytes[start..end].copy_from_slice(data);
        self.inodes.insert(entry.path.clone(), Inode::File(bytes));
        self.handles
            .with_mut(handle, |e| e.cursor = end as u64)
            .ok_or_else(|| FsError::bad_handle(handle))?;
        Ok(data.len())
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        let entry = self.handles.get(handle).ok_or_else(|| FsError::bad_handle(handle))?;
        let mut bytes = self.file_bytes(&entry.path)?;
        bytes.resize(len as usize, 0);
        self.inodes.insert(entry.path.clone(), Inode::File(bytes));
        Ok(())
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        self.handles
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| FsError::bad_handle(handle))
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        match self.inodes.get(path).map(|e| e.clone()) {
            Some(Inode::File(_)) => {
                self.inodes.remove(path);
                self.unlink_name(path);
                Ok(())
            }
            Some(Inode::Directory) => Err(FsError::IsADirectory { path: path.clone() }),
            None => Err(FsError::NotFound { path: path.clone() }),
        }
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        if self.inodes.contains_key(path) {
            return Err(FsError::AlreadyExists { path: path.clone() });
        }
        self.inodes.insert(path.clone(), Inode::Directory);
        self.children.insert(path.clone(), BTreeSet::new());
        self.link(path);
        Ok(())
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        match self.inodes.get(path).map(|e| e.clone()) {
            Some(Inode::Directory) => {
                if path.is_root() {
                    return Err(FsError::Unsupported {
                        operation: "rmdir",
                        detail: "cannot remove the root".into(),
                    });
                }
                if !self.children.get(path).map(|s| s.is_empty()).unwrap_or(true) {
                    return Err(FsError::NotEmpty { path: path.clone() });
                }
                self.inodes.remove(path);
                self.children.remove(path);
                self.unlink_name(path);
                Ok(())
            }
            Some(Inode::File(_)) => Err(FsError::NotADirectory { path: path.clone() }),
            None => Err(FsError::NotFound { path: path.clone() }),
        }
    }

    fn scope(&self) -> AccessScope {
        AccessScope::Thread
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mkdir_rmdir_are_inverse() {
        let fs = MemoryUfs::new();
        let dir = UfsPath::new("/a");
        fs.mkdir(&dir).unwrap();
        assert!(fs.info(&dir).unwrap().is_dir());
        fs.rmdir(&dir).unwrap();
        assert!(fs.info(&dir).is_err());
    }

    #[test]
    fn mkdir_twice_is_already_exists() {
        let fs = MemoryUfs::new();
        fs.mkdir(&UfsPath::new("/a")).unwrap();
        assert!(matches!(
            fs.mkdir(&UfsPath::new("/a")),
            Err(FsError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn rmdir_nonempty_fails() {
        let fs = MemoryUfs::new();
        fs.mkdir(&UfsPath::new("/a")).unwrap();
        fs.put(&UfsPath::new("/a/f.txt"), b"x").unwrap();
        assert!(matches!(
            fs.rmdir(&UfsPath::new("/a")),
            Err(FsError::NotEmpty { .. })
        ));
    }

    #[test]
    fn ls_reports_children() {
        let fs = MemoryUfs::new();
        fs.mkdir(&UfsPath::new("/a")).unwrap();
        fs.put(&UfsPath::new("/a/one.txt"), b"1").unwrap();
        fs.put(&UfsPath::new("/a/two.txt"), b"2").unwrap();
        let mut names = fs.ls(&UfsPath::new("/a")).unwrap();
        names.sort();
        assert_eq!(names, vec!["one.txt", "two.txt"]);
    }

    #[test]
    fn seek_read_write_cursor_semantics() {
        let fs = MemoryUfs::new();
        let path = UfsPath::new("/f.txt");
        fs.put(&path, b"0123456789").unwrap();
        let h = fs.open(&path, Mode::READ, None).unwrap();
        assert_eq!(fs.seek(h, 3, Whence::Start).unwrap(), 3);
        assert_eq!(fs.read(h, 4).unwrap(), b"3456");
        assert_eq!(fs.seek(h, -2, Whence::Current).unwrap(), 5);
        assert_eq!(fs.read(h, 100).unwrap(), b"56789");
        fs.close(h).unwrap();
    }

    #[test]
    fn append_mode_starts_at_end() {
        let fs = MemoryUfs::new();
        let path = UfsPath::new("/f.txt");
        fs.put(&path, b"abc").unwrap();
        let h = fs.open(&path, Mode::APPEND, None).unwrap();
        fs.write(h, b"def").unwrap();
        fs.close(h).unwrap();
        assert_eq!(fs.cat(&path).unwrap(), b"abcdef");
    }

    #[test]
    fn write_handle_cannot_read() {
        let fs = MemoryUfs::new();
        let path = UfsPath::new("/f.txt");
        let h = fs.open(&path, Mode::WRITE, None).unwrap();
        assert!(matches!(fs.read(h, 1), Err(FsError::Unsupported { .. })));
        fs.close(h).unwrap();
    }

    #[test]
    fn truncate_resizes() {
        let fs = MemoryUfs::new();
        let path = UfsPath::new("/f.txt");
        fs.put(&path, b"0123456789").unwrap();
        let h = fs.open(&path, Mode::WRITE, None).unwrap();
        fs.truncate(h, 3).unwrap();
        fs.close(h).unwrap();
        assert_eq!(fs.cat(&path).unwrap(), b"012");
    }

    #[test]
    fn unlink_removes_from_listing() {
        let fs = MemoryUfs::new();
        fs.put(&UfsPath::new("/a.txt"), b"x").unwrap();
        fs.unlink(&UfsPath::new("/a.txt")).unwrap();
        assert_eq!(fs.ls(&UfsPath::root()).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn scope_is_thread() {
        assert_eq!(MemoryUfs::new().scope(), AccessScope::Thread);
    }
}
