//! # Mount fallback — two-phase copy-in/diff-out mirror
//!
//! For stores whose [`AccessScope`] is below `System` (a FUSE mount would
//! not be observable from the kernel's side), present the same "ordinary
//! directory on disk" surface via a scratch copy instead: copy the tree in
//! on [`FallbackMount::start`], let the caller use the scratch directory
//! with ordinary OS calls, then diff it back on [`FallbackMount::stop`].
//!
//! This is a moment-in-time mirror, not a live view: behavior is only
//! defined while the wrapped store is quiesced for the mount's lifetime.

use std::collections::BTreeSet;
use std::path::Path;

use crate::combinators::tempdir::TemporaryDirectory;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::ops::{self, walk};
use crate::path::UfsPath;

/// Drives the copy-in/diff-out mirror described above for one store.
pub struct FallbackMount<B> {
    inner: B,
    root: UfsPath,
    readonly: bool,
    scratch: Option<TemporaryDirectory>,
    baseline: BTreeSet<UfsPath>,
}

impl<B: Ufs> FallbackMount<B> {
    /// Prepare a mirror of `root` within `inner`.
    pub fn new(inner: B, root: UfsPath, readonly: bool) -> Self {
        Self {
            inner,
            root,
            readonly,
            scratch: None,
            baseline: BTreeSet::new(),
        }
    }

    /// Copy the tree under `root` into a fresh scratch directory and
    /// return its host path. Must be called before [`Self::stop`].
    pub fn start(&mut self) -> Result<&Path, FsError> {
        let scratch = TemporaryDirectory::new()?;
        if self.inner.info(&self.root).is_ok() {
            ops::copytree(&self.inner, &self.root, &scratch, &UfsPath::root(), true)?;
        }
        self.baseline = walk(&scratch, &UfsPath::root(), true)?
            .into_iter()
            .map(|e| e.path)
            .collect();
        self.scratch = Some(scratch);
        Ok(self.scratch.as_ref().expect("just assigned").path())
    }

    /// Diff the scratch directory against the baseline recorded by
    /// [`Self::start`] and, unless this mount is readonly, apply the
    /// difference back onto the wrapped store: removed entries are
    /// deleted, added or changed entries are copied back.
    pub fn stop(&mut self) -> Result<(), FsError> {
        let scratch = self.scratch.take().ok_or_else(|| FsError::Unsupported {
            operation: "fallback mount stop",
            detail: "start() was never called".into(),
        })?;

        if self.readonly {
            return Ok(());
        }

        let now: Vec<_> = walk(&scratch, &UfsPath::root(), false)?;
        let now_paths: BTreeSet<_> = now.iter().map(|e| e.path.clone()).collect();

        for removed in self.baseline.difference(&now_paths) {
            let ufs_path = self.root.join(removed.to_string());
            match self.inner.info(&ufs_path) {
                Ok(info) if info.is_dir() => {
                    let _ = self.inner.rmdir(&ufs_path);
                }
                Ok(_) => {
                    let _ = self.inner.unlink(&ufs_path);
                }
                Err(_) => {}
            }
        }

        for entry in walk(&scratch, &UfsPath::root(), true)? {
            let ufs_path = self.root.join(entry.path.to_string());
            if entry.info.is_dir() {
                match self.inner.mkdir(&ufs_path) {
                    Ok(()) | Err(FsError::AlreadyExists { .. }) => {}
                    Err(e) => return Err(e),
                }
            } else {
                ops::copyfile(&scratch, &entry.path, &self.inner, &ufs_path)?;
            }
        }

        Ok(())
    }

    /// The wrapped store.
    pub fn into_inner(self) -> B {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;
    use std::fs;

    #[test]
    fn start_copies_tree_run_writes_stop_copies_back() {
        let fs_store = MemoryUfs::new();
        fs_store.mkdir(&UfsPath::new("/project")).unwrap();
        fs_store.put(&UfsPath::new("/project/a.txt"), b"original").unwrap();

        let mut mount = FallbackMount::new(fs_store, UfsPath::new("/project"), false);
        let host = mount.start().unwrap().to_path_buf();
        assert_eq!(fs::read(host.join("a.txt")).unwrap(), b"original");

        fs::write(host.join("a.txt"), b"edited").unwrap();
        fs::write(host.join("b.txt"), b"new file").unwrap();
        fs::remove_file(host.join("a.txt")).unwrap();

        mount.stop().unwrap();
        let fs_store = mount.into_inner();
        assert!(fs_store.info(&UfsPath::new("/project/a.txt")).is_err());
        assert_eq!(fs_store.cat(&UfsPath::new("/project/b.txt")).unwrap(), b"new file");
    }

    #[test]
    fn readonly_mount_never_writes_back() {
        let fs_store = MemoryUfs::new();
        fs_store.mkdir(&UfsPath::new("/ro")).unwrap();
        fs_store.put(&UfsPath::new("/ro/a.txt"), b"stays").unwrap();

        let mut mount = FallbackMount::new(fs_store, UfsPath::new("/ro"), true);
        let host = mount.start().unwrap().to_path_buf();
        fs::write(host.join("a.txt"), b"changed locally").unwrap();
        mount.stop().unwrap();

        let fs_store = mount.into_inner();
        assert_eq!(fs_store.cat(&UfsPath::new("/ro/a.txt")).unwrap(), b"stays");
    }
}
