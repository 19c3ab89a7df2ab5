//! # `DirCache` — a TTL cache over directory listings
//!
//! `ls` and `info` results are cached for a fixed time-to-live via
//! `moka::sync::Cache` (the same caching crate `nfs-mamont` reaches for),
//! rather than a hand-rolled expiring map. Invalidated eagerly on every
//! operation that could change a directory's children or metadata,
//! mirroring the eager-invalidation discipline of the Python source's
//! `DirCache`.

use std::time::Duration;

use moka::sync::Cache;

use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// Caches `ls` and `info` results for `inner` with a fixed TTL.
pub struct DirCache<B> {
    inner: B,
    cache: Cache<UfsPath, Vec<String>>,
    info_cache: Cache<UfsPath, FileStat>,
}

impl<B: Ufs> DirCache<B> {
    /// Wrap `inner`, caching up to `max_capacity` directories for `ttl`.
    pub fn new(inner: B, ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();
        let info_cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();
        Self { inner, cache, info_cache }
    }

    fn invalidate(&self, path: &UfsPath) {
        self.cache.invalidate(path);
        self.cache.invalidate(&path.parent());
        self.info_cache.invalidate(path);
        self.info_cache.invalidate(&path.parent());
    }
}

impl<B: Ufs> Ufs for DirCache<B> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(cached);
        }
        let listing = self.inner.ls(path)?;
        self.cache.insert(path.clone(), listing.clone());
        Ok(listing)
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        if let Some(cached) = self.info_cache.get(path) {
            return Ok(cached);
        }
        let stat = self.inner.info(path)?;
        self.info_cache.insert(path.clone(), stat.clone());
        Ok(stat)
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        if mode.can_write() {
            self.invalidate(path);
        }
        self.inner.open(path, mode, size_hint)
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        self.inner.seek(handle, pos, whence)
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        self.inner.read(handle, n)
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        self.inner.write(handle, data)
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        self.inner.truncate(handle, len)
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        self.inner.close(handle)
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        self.invalidate(path);
        self.inner.unlink(path)
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.invalidate(path);
        self.inner.mkdir(path)
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.invalidate(path);
        self.inner.rmdir(path)
    }

    fn flush(&self, handle: u64) -> Result<(), FsError> {
        self.inner.flush(handle)
    }

    fn start(&self) -> Result<(), FsError> {
        self.inner.start()
    }

    fn stop(&self) -> Result<(), FsError> {
        self.inner.stop()
    }

    fn scope(&self) -> AccessScope {
        self.inner.scope()
    }
}

/// A [`crate::layer::Layer`] that wraps a store with [`DirCache`].
pub struct DirCacheLayer {
    ttl: Duration,
    max_capacity: u64,
}

impl DirCacheLayer {
    /// Cache directories for `ttl`, up to `max_capacity` entries.
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self { ttl, max_capacity }
    }
}

impl<B: Ufs> crate::layer::Layer<B> for DirCacheLayer {
    type Store = DirCache<B>;

    fn layer(self, store: B) -> Self::Store {
        DirCache::new(store, self.ttl, self.max_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[test]
    fn caches_listing_until_invalidated() {
        let fs = DirCache::new(MemoryUfs::new(), Duration::from_secs(60), 100);
        fs.put(&UfsPath::new("/a.txt"), b"1").unwrap();
        assert_eq!(fs.ls(&UfsPath::root()).unwrap(), vec!["a.txt"]);

        fs.put(&UfsPath::new("/b.txt"), b"2").unwrap();
        // Root was invalidated by the second `open` for write.
        let mut names = fs.ls(&UfsPath::root()).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn caches_info_until_invalidated() {
        let fs = DirCache::new(MemoryUfs::new(), Duration::from_secs(60), 100);
        fs.mkdir(&UfsPath::new("/d")).unwrap();
        assert!(fs.info(&UfsPath::new("/d")).unwrap().is_dir());

        // `rmdir` invalidates the cached stat; a second `info` call must
        // see the removal rather than serve a stale directory entry.
        fs.rmdir(&UfsPath::new("/d")).unwrap();
        assert!(matches!(fs.info(&UfsPath::new("/d")), Err(FsError::NotFound { .. })));
    }

    #[test]
    fn unlink_invalidates_parent() {
        let fs = DirCache::new(MemoryUfs::new(), Duration::from_secs(60), 100);
        fs.put(&UfsPath::new("/a.txt"), b"1").unwrap();
        let _ = fs.ls(&UfsPath::root()).unwrap();
        fs.unlink(&UfsPath::new("/a.txt")).unwrap();
        assert_eq!(fs.ls(&UfsPath::root()).unwrap(), Vec::<String>::new());
    }
}
