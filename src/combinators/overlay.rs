//! # `Overlay` — copy-up over a read-mostly lower store
//!
//! Reads check the upper store first, falling back to the lower store.
//! Any write target that exists only in the lower store is copied up
//! before the write proceeds, so the lower store is never mutated.
//!
//! `unlink` of a lower-only path is a pass-through no-op: there is no
//! whiteout bookkeeping, so the lower file stays visible afterward. This
//! matches the behavior observed in the distilled-from source and is
//! pinned as the resolution to the corresponding open design question.

use std::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeSet;

use dashmap::DashMap;

use crate::contract::Ufs;
use crate::error::FsError;
use crate::handle::FIRST_HANDLE;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, OpenMode, Whence};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Upper,
    Lower,
}

/// A writable upper store layered over a lower store.
pub struct Overlay<U, L> {
    upper: U,
    lower: L,
    handles: DashMap<u64, (Side, u64)>,
    next_id: AtomicU64,
}

impl<U: Ufs, L: Ufs> Overlay<U, L> {
    /// Layer `upper` (writable) over `lower` (read-mostly).
    pub fn new(upper: U, lower: L) -> Self {
        Self {
            upper,
            lower,
            handles: DashMap::new(),
            next_id: AtomicU64::new(FIRST_HANDLE),
        }
    }

    fn exists_upper(&self, path: &UfsPath) -> bool {
        self.upper.info(path).is_ok()
    }

    fn lower_file(&self, path: &UfsPath) -> Result<Option<FileStat>, FsError> {
        match self.lower.info(path) {
            Ok(stat) => Ok(Some(stat)),
            Err(FsError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Copy a lower-only file into the upper store before it is mutated.
    fn copy_up(&self, path: &UfsPath, mode: Mode) -> Result<(), FsError> {
        if !mode.can_write() || self.exists_upper(path) {
            return Ok(());
        }
        if let Some(stat) = self.lower_file(path)? {
            if stat.is_file() && mode.kind != OpenMode::Write {
                let data = self.lower.cat(path)?;
                self.upper.put(path, &data)?;
            }
        }
        Ok(())
    }

    fn alloc(&self, side: Side, inner: u64) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handles.insert(id, (side, inner));
        id
    }

    fn handle_of(&self, handle: u64) -> Result<(Side, u64), FsError> {
        self.handles.get(&handle).map(|e| *e).ok_or_else(|| FsError::bad_handle(handle))
    }
}

impl<U: Ufs, L: Ufs> Ufs for Overlay<U, L> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        let upper = self.upper.ls(path);
        let lower = self.lower.ls(path);
        match (upper, lower) {
            (Ok(u), Ok(l)) => {
                let merged: BTreeSet<String> = u.into_iter().chain(l).collect();
                Ok(merged.into_iter().collect())
            }
            (Ok(u), Err(_)) => Ok(u),
            (Err(_), Ok(l)) => Ok(l),
            (Err(e), Err(_)) => Err(e),
        }
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        match self.upper.info(path) {
            Ok(stat) => Ok(stat),
            Err(FsError::NotFound { .. }) => self.lower.info(path),
            Err(e) => Err(e),
        }
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        if mode.can_write() {
            self.copy_up(path, mode)?;
            let inner = self.upper.open(path, mode, size_hint)?;
            return Ok(self.alloc(Side::Upper, inner));
        }
        if self.exists_upper(path) {
            let inner = self.upper.open(path, mode, size_hint)?;
            return Ok(self.alloc(Side::Upper, inner));
        }
        let inner = self.lower.open(path, mode, size_hint)?;
        Ok(self.alloc(Side::Lower, inner))
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        let (side, inner) = self.handle_of(handle)?;
        match side {
            Side::Upper => self.upper.seek(inner, pos, whence),
            Side::Lower => self.lower.seek(inner, pos, whence),
        }
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        let (side, inner) = self.handle_of(handle)?;
        match side {
            Side::Upper => self.upper.read(inner, n),
            Side::Lower => self.lower.read(inner, n),
        }
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        let (side, inner) = self.handle_of(handle)?;
        match side {
            Side::Upper => self.upper.write(inner, data),
            Side::Lower => Err(FsError::Unsupported {
                operation: "write",
                detail: "lower store is read-only through the overlay".into(),
            }),
        }
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        let (side, inner) = self.handle_of(handle)?;
        match side {
            Side::Upper => self.upper.truncate(inner, len),
            Side::Lower => Err(FsError::Unsupported {
                operation: "truncate",
                detail: "lower store is read-only through the overlay".into(),
            }),
        }
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        let (_, (side, inner)) = self.handles.remove(&handle).ok_or_else(|| FsError::bad_handle(handle))?;
        match side {
            Side::Upper => self.upper.close(inner),
            Side::Lower => self.lower.close(inner),
        }
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        let had_upper = self.exists_upper(path);
        if had_upper {
            self.upper.unlink(path)?;
        }
        if !had_upper && self.lower_file(path)?.is_none() {
            return Err(FsError::NotFound { path: path.clone() });
        }
        // A lower-only path is left untouched (pass-through, no whiteout).
        Ok(())
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        if self.exists_upper(path) || self.lower_file(path)?.is_some() {
            return Err(FsError::AlreadyExists { path: path.clone() });
        }
        self.upper.mkdir(path)
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        if !self.ls(path)?.is_empty() {
            return Err(FsError::NotEmpty { path: path.clone() });
        }
        if self.exists_upper(path) {
            self.upper.rmdir(path)?;
        }
        Ok(())
    }

    fn flush(&self, handle: u64) -> Result<(), FsError> {
        let (side, inner) = self.handle_of(handle)?;
        match side {
            Side::Upper => self.upper.flush(inner),
            Side::Lower => self.lower.flush(inner),
        }
    }

    fn start(&self) -> Result<(), FsError> {
        self.upper.start()?;
        self.lower.start()
    }

    fn stop(&self) -> Result<(), FsError> {
        self.upper.stop()?;
        self.lower.stop()
    }

    fn scope(&self) -> AccessScope {
        self.upper.scope().min(self.lower.scope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    fn make() -> Overlay<MemoryUfs, MemoryUfs> {
        Overlay::new(MemoryUfs::new(), MemoryUfs::new())
    }

    #[test]
    fn reads_fall_back_to_lower() {
        let ov = make();
        ov.lower.put(&UfsPath::new("/a.txt"), b"from-lower").unwrap();
        assert_eq!(ov.cat(&UfsPath::new("/a.txt")).unwrap(), b"from-lower");
    }

    #[test]
    fn upper_masks_lower() {
        let ov = make();
        ov.lower.put(&UfsPath::new("/a.txt"), b"from-lower").unwrap();
        ov.upper.put(&UfsPath::new("/a.txt"), b"from-upper").unwrap();
        assert_eq!(ov.cat(&UfsPath::new("/a.txt")).unwrap(), b"from-upper");
    }

    #[test]
    fn writing_a_lower_only_file_copies_it_up() {
        let ov = make();
        ov.lower.put(&UfsPath::new("/a.txt"), b"original").unwrap();
        let h = ov.open(&UfsPath::new("/a.txt"), Mode::APPEND, None).unwrap();
        ov.write(h, b"-appended").unwrap();
        ov.close(h).unwrap();
        assert_eq!(ov.cat(&UfsPath::new("/a.txt")).unwrap(), b"original-appended");
        assert_eq!(ov.lower.cat(&UfsPath::new("/a.txt")).unwrap(), b"original");
    }

    #[test]
    fn unlink_of_lower_only_path_is_pass_through() {
        let ov = make();
        ov.lower.put(&UfsPath::new("/a.txt"), b"still-here").unwrap();
        ov.unlink(&UfsPath::new("/a.txt")).unwrap();
        assert_eq!(ov.cat(&UfsPath::new("/a.txt")).unwrap(), b"still-here");
    }

    #[test]
    fn unlink_removes_upper_copy() {
        let ov = make();
        ov.upper.put(&UfsPath::new("/a.txt"), b"x").unwrap();
        ov.unlink(&UfsPath::new("/a.txt")).unwrap();
        assert!(ov.upper.info(&UfsPath::new("/a.txt")).is_err());
    }

    #[test]
    fn ls_merges_both_sides() {
        let ov = make();
        ov.lower.put(&UfsPath::new("/a.txt"), b"1").unwrap();
        ov.upper.put(&UfsPath::new("/b.txt"), b"2").unwrap();
        let mut names = ov.ls(&UfsPath::root()).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
