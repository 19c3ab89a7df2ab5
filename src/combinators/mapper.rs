//! # `Mapper` — routes across several mounted stores
//!
//! A prefix-tree router: several stores are mounted at distinct path
//! prefixes and a single outer `Ufs` view is synthesized over all of
//! them. Paths that fall between mount points (but still have mounted
//! descendants) report as synthetic directories; paths with no mounted
//! descendant at all are `NotFound`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::prefix_tree::PrefixTree;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::handle::FIRST_HANDLE;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// Routes operations to whichever mounted store owns a path.
pub struct Mapper {
    tree: PrefixTree<Arc<dyn Ufs>>,
    handles: DashMap<u64, (Arc<dyn Ufs>, u64)>,
    next_id: AtomicU64,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    /// An empty router with nothing mounted.
    pub fn new() -> Self {
        Self {
            tree: PrefixTree::new(),
            handles: DashMap::new(),
            next_id: AtomicU64::new(FIRST_HANDLE),
        }
    }

    /// Mount `store` so its root appears at `prefix`.
    pub fn mount(&mut self, prefix: impl Into<UfsPath>, store: Arc<dyn Ufs>) {
        let prefix = prefix.into();
        self.tree.insert(prefix.parts(), store);
    }

    fn resolve(&self, path: &UfsPath) -> Option<(Arc<dyn Ufs>, UfsPath)> {
        let (store, consumed) = self.tree.search(path.parts());
        store.map(|s| {
            let rel = UfsPath::from_parts(path.parts()[consumed..].to_vec());
            (s, rel)
        })
    }

    fn no_mount(path: &UfsPath) -> FsError {
        FsError::NotFound { path: path.clone() }
    }
}

impl Ufs for Mapper {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        match self.resolve(path) {
            Some((store, rel)) => {
                let mut entries = store.ls(&rel)?;
                // A mount exactly at `path` (an empty `rel`) can have further
                // mounts nested under it in the tree; union their synthetic
                // names in rather than hiding them behind the store's own.
                if rel.parts().is_empty() {
                    if let Some(nested) = self.tree.list(path.parts()) {
                        for name in nested {
                            if !entries.contains(&name) {
                                entries.push(name);
                            }
                        }
                    }
                }
                Ok(entries)
            }
            None => self.tree.list(path.parts()).ok_or_else(|| Self::no_mount(path)),
        }
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        if let Some((store, rel)) = self.resolve(path) {
            return store.info(&rel);
        }
        if self.tree.list(path.parts()).is_some() {
            return Ok(FileStat::directory());
        }
        Err(Self::no_mount(path))
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        let (store, rel) = self.resolve(path).ok_or_else(|| Self::no_mount(path))?;
        let inner_handle = store.open(&rel, mode, size_hint)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handles.insert(id, (store, inner_handle));
        Ok(id)
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        let (store, inner) = self.handles.get(&handle).map(|e| e.clone()).ok_or_else(|| FsError::bad_handle(handle))?;
        store.seek(inner, pos, whence)
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        let (store, inner) = self.handles.get(&handle).map(|e| e.clone()).ok_or_else(|| FsError::bad_handle(handle))?;
        store.read(inner, n)
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        let (store, inner) = self.handles.get(&handle).map(|e| e.clone()).ok_or_else(|| FsError::bad_handle(handle))?;
        store.write(inner, data)
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        let (store, inner) = self.handles.get(&handle).map(|e| e.clone()).ok_or_else(|| FsError::bad_handle(handle))?;
        store.truncate(inner, len)
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        let (store, inner) = self.handles.remove(&handle).map(|(_, v)| v).ok_or_else(|| FsError::bad_handle(handle))?;
        store.close(inner)
    }

    fn flush(&self, handle: u64) -> Result<(), FsError> {
        let (store, inner) = self.handles.get(&handle).map(|e| e.clone()).ok_or_else(|| FsError::bad_handle(handle))?;
        store.flush(inner)
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        let (store, rel) = self.resolve(path).ok_or_else(|| Self::no_mount(path))?;
        store.unlink(&rel)
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        let (store, rel) = self.resolve(path).ok_or_else(|| Self::no_mount(path))?;
        store.mkdir(&rel)
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        let (store, rel) = self.resolve(path).ok_or_else(|| Self::no_mount(path))?;
        store.rmdir(&rel)
    }

    fn start(&self) -> Result<(), FsError> {
        for store in self.tree.values() {
            store.start()?;
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), FsError> {
        for store in self.tree.values() {
            store.stop()?;
        }
        Ok(())
    }

    fn scope(&self) -> AccessScope {
        self.tree
            .values()
            .into_iter()
            .map(|s| s.scope())
            .min()
            .unwrap_or(AccessScope::Universe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[test]
    fn routes_to_the_right_mount() {
        let mut mapper = Mapper::new();
        let a: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
        let b: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
        a.put(&UfsPath::new("/x.txt"), b"from-a").unwrap();
        b.put(&UfsPath::new("/x.txt"), b"from-b").unwrap();
        mapper.mount("/a", a);
        mapper.mount("/b", b);

        assert_eq!(mapper.cat(&UfsPath::new("/a/x.txt")).unwrap(), b"from-a");
        assert_eq!(mapper.cat(&UfsPath::new("/b/x.txt")).unwrap(), b"from-b");
    }

    #[test]
    fn synthesizes_intermediate_directories() {
        let mut mapper = Mapper::new();
        let store: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
        mapper.mount("/a/b", store);
        assert!(mapper.info(&UfsPath::new("/a")).unwrap().is_dir());
        assert_eq!(mapper.ls(&UfsPath::new("/a")).unwrap(), vec!["b"]);
    }

    #[test]
    fn unmounted_path_is_not_found() {
        let mapper = Mapper::new();
        assert!(matches!(
            mapper.info(&UfsPath::new("/nowhere")),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn ls_unions_a_mount_with_nested_mounts_beneath_it() {
        let mut mapper = Mapper::new();
        let outer: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
        outer.mkdir(&UfsPath::new("/own-dir")).unwrap();
        let inner: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
        mapper.mount("/a", outer);
        mapper.mount("/a/nested", inner);

        let mut names = mapper.ls(&UfsPath::new("/a")).unwrap();
        names.sort();
        assert_eq!(names, vec!["nested", "own-dir"]);
    }

    #[test]
    fn handles_round_trip_through_the_router() {
        let mut mapper = Mapper::new();
        let store: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
        mapper.mount("/a", store);
        mapper.put(&UfsPath::new("/a/f.txt"), b"payload").unwrap();
        assert_eq!(mapper.cat(&UfsPath::new("/a/f.txt")).unwrap(), b"payload");
    }
}
