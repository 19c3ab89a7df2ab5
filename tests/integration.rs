//! Cross-cutting scenarios spanning more than one module: a leaf backend
//! plus a combinator, an execution bridge, or the high-level `ops` helpers
//! working together. Single-module behavior lives in that module's own
//! `#[cfg(test)]` block; this file exercises the seams between them.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use ufs::backends::{LocalUfs, MemoryUfs};
use ufs::combinators::{DirCache, Mapper, Overlay};
use ufs::exec::{AsyncToSync, SyncToAsync};
use ufs::ops;
use ufs::{FsError, Mode, Ufs, UfsPath, Whence};

fn roundtrip_put_cat<B: Ufs>(fs: &B) {
    let path = UfsPath::new("/roundtrip.txt");
    fs.put(&path, b"the quick brown fox").unwrap();
    assert_eq!(fs.cat(&path).unwrap(), b"the quick brown fox");
    assert_eq!(fs.info(&path).unwrap().size, 20);
}

#[test]
fn roundtrip_across_memory_and_local_backends() {
    roundtrip_put_cat(&MemoryUfs::new());

    let dir = tempdir().unwrap();
    roundtrip_put_cat(&LocalUfs::new(dir.path()));
}

fn mkdir_rmdir_is_idempotent_inverse<B: Ufs>(fs: &B) {
    let path = UfsPath::new("/work");
    fs.mkdir(&path).unwrap();
    assert!(fs.info(&path).unwrap().is_dir());
    assert!(matches!(fs.mkdir(&path), Err(FsError::AlreadyExists { .. })));

    fs.rmdir(&path).unwrap();
    assert!(fs.info(&path).is_err());
    assert!(matches!(fs.rmdir(&path), Err(FsError::NotFound { .. })));

    // mkdir after rmdir recreates cleanly: the two ops are true inverses.
    fs.mkdir(&path).unwrap();
    assert!(fs.info(&path).unwrap().is_dir());
}

#[test]
fn mkdir_rmdir_idempotence_across_backends() {
    mkdir_rmdir_is_idempotent_inverse(&MemoryUfs::new());

    let dir = tempdir().unwrap();
    mkdir_rmdir_is_idempotent_inverse(&LocalUfs::new(dir.path()));
}

#[test]
fn rename_moves_content_and_removes_the_source() {
    let fs = MemoryUfs::new();
    let src = UfsPath::new("/a.txt");
    let dst = UfsPath::new("/b.txt");
    fs.put(&src, b"payload").unwrap();

    fs.rename(&src, &dst).unwrap();

    assert!(fs.info(&src).is_err());
    assert_eq!(fs.cat(&dst).unwrap(), b"payload");
}

#[test]
fn listing_stays_coherent_across_writes_and_removals() {
    let fs = MemoryUfs::new();
    fs.mkdir(&UfsPath::new("/dir")).unwrap();
    fs.put(&UfsPath::new("/dir/a.txt"), b"1").unwrap();
    fs.put(&UfsPath::new("/dir/b.txt"), b"2").unwrap();

    let mut names = fs.ls(&UfsPath::new("/dir")).unwrap();
    names.sort();
    assert_eq!(names, vec!["a.txt", "b.txt"]);

    fs.unlink(&UfsPath::new("/dir/a.txt")).unwrap();
    assert_eq!(fs.ls(&UfsPath::new("/dir")).unwrap(), vec!["b.txt"]);

    fs.put(&UfsPath::new("/dir/c.txt"), b"3").unwrap();
    let mut names = fs.ls(&UfsPath::new("/dir")).unwrap();
    names.sort();
    assert_eq!(names, vec!["b.txt", "c.txt"]);
}

/// The exact seek/read/write script: open `"Hello World!"` for update,
/// lowercase the first and seventh bytes in place, then read it back whole.
fn hello_world_to_lowercase<B: Ufs>(fs: &B) {
    let path = UfsPath::new("/greeting.txt");
    fs.put(&path, b"Hello World!").unwrap();

    let h = fs.open(&path, Mode::READ_UPDATE, None).unwrap();
    fs.seek(h, 0, Whence::Start).unwrap();
    fs.write(h, b"h").unwrap();
    fs.seek(h, 6, Whence::Start).unwrap();
    fs.write(h, b"w").unwrap();
    fs.seek(h, 0, Whence::Start).unwrap();
    let out = fs.read(h, 12).unwrap();
    fs.close(h).unwrap();

    assert_eq!(out, b"hello world!");
    assert_eq!(fs.cat(&path).unwrap(), b"hello world!");
}

#[test]
fn seek_read_write_sequence_across_backends() {
    hello_world_to_lowercase(&MemoryUfs::new());

    let dir = tempdir().unwrap();
    hello_world_to_lowercase(&LocalUfs::new(dir.path()));
}

#[test]
fn overlay_masks_lower_and_copies_up_on_write_without_mutating_it() {
    let upper = MemoryUfs::new();
    let lower = MemoryUfs::new();
    lower.put(&UfsPath::new("/shared.txt"), b"base").unwrap();
    lower.put(&UfsPath::new("/lower-only.txt"), b"untouched").unwrap();

    let ov = Overlay::new(upper, lower);

    // Lower-only reads pass through.
    assert_eq!(ov.cat(&UfsPath::new("/lower-only.txt")).unwrap(), b"untouched");

    // A write to a lower-only path copies it up; the lower copy is untouched.
    let h = ov.open(&UfsPath::new("/shared.txt"), Mode::APPEND, None).unwrap();
    ov.write(h, b"-upper").unwrap();
    ov.close(h).unwrap();
    assert_eq!(ov.cat(&UfsPath::new("/shared.txt")).unwrap(), b"base-upper");

    // unlink of a lower-only path is a documented pass-through no-op.
    ov.unlink(&UfsPath::new("/lower-only.txt")).unwrap();
    assert_eq!(ov.cat(&UfsPath::new("/lower-only.txt")).unwrap(), b"untouched");
}

#[test]
fn dircache_ttl_zero_never_serves_stale_listings() {
    let fs = DirCache::new(MemoryUfs::new(), Duration::from_secs(0), 100);
    fs.put(&UfsPath::new("/a.txt"), b"1").unwrap();
    assert_eq!(fs.ls(&UfsPath::root()).unwrap(), vec!["a.txt"]);

    fs.put(&UfsPath::new("/b.txt"), b"2").unwrap();
    let mut names = fs.ls(&UfsPath::root()).unwrap();
    names.sort();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}

#[test]
fn dircache_ttl_positive_is_invalidated_by_writes_through_the_cache() {
    let fs = DirCache::new(MemoryUfs::new(), Duration::from_secs(300), 100);
    fs.put(&UfsPath::new("/a.txt"), b"1").unwrap();
    let first = fs.ls(&UfsPath::root()).unwrap();
    assert_eq!(first, vec!["a.txt"]);

    // A second write invalidates root even though the TTL hasn't elapsed,
    // because `open` for write eagerly invalidates its parent directory.
    fs.put(&UfsPath::new("/b.txt"), b"2").unwrap();
    let mut second = fs.ls(&UfsPath::root()).unwrap();
    second.sort();
    assert_eq!(second, vec!["a.txt", "b.txt"]);
}

#[tokio::test]
async fn execution_bridges_are_transparent_in_both_directions() {
    // Sync -> async -> drive it asynchronously.
    let forward = SyncToAsync::spawn(MemoryUfs::new());
    let path = UfsPath::new("/via-bridge.txt");
    ufs::contract::asynch::AsyncUfs::put(&forward, &path, b"round one").await.unwrap();
    assert_eq!(
        ufs::contract::asynch::AsyncUfs::cat(&forward, &path).await.unwrap(),
        b"round one"
    );

    // Async -> sync -> drive it synchronously, from a blocking context.
    let handle = tokio::task::spawn_blocking(|| {
        let backward = AsyncToSync::spawn(ufs::exec::SimpleAsync::new(MemoryUfs::new()));
        let path = UfsPath::new("/via-bridge.txt");
        backward.put(&path, b"round two").unwrap();
        backward.cat(&path).unwrap()
    });
    assert_eq!(handle.await.unwrap(), b"round two");
}

#[test]
fn content_addressed_store_dedupes_identical_blobs_and_rehashes_on_change() {
    use ufs::backends::remote::drs::{hash_bytes, DrsTransport};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct InMemoryTransport {
        blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        blob_puts: Arc<std::sync::atomic::AtomicUsize>,
        paths: Mutex<HashMap<String, String>>,
    }

    impl DrsTransport for InMemoryTransport {
        fn get_blob(&self, hash: &str) -> Result<Vec<u8>, FsError> {
            self.blobs
                .lock()
                .unwrap()
                .get(hash)
                .cloned()
                .ok_or_else(|| FsError::NotFound { path: UfsPath::new(format!("/{hash}")) })
        }
        fn put_blob(&self, hash: &str, data: &[u8]) -> Result<(), FsError> {
            let mut blobs = self.blobs.lock().unwrap();
            if !blobs.contains_key(hash) {
                blobs.insert(hash.to_string(), data.to_vec());
                self.blob_puts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            Ok(())
        }
        fn resolve(&self, path: &str) -> Result<Option<String>, FsError> {
            Ok(self.paths.lock().unwrap().get(path).cloned())
        }
        fn bind(&self, path: &str, hash: &str) -> Result<(), FsError> {
            self.paths.lock().unwrap().insert(path.to_string(), hash.to_string());
            Ok(())
        }
        fn unbind(&self, path: &str) -> Result<(), FsError> {
            self.paths.lock().unwrap().remove(path);
            Ok(())
        }
        fn children(&self, _path: &str) -> Result<Vec<String>, FsError> {
            Ok(Vec::new())
        }
    }

    let blob_puts = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let transport = InMemoryTransport {
        blobs: Arc::new(Mutex::new(HashMap::new())),
        blob_puts: blob_puts.clone(),
        paths: Mutex::new(HashMap::new()),
    };
    let store = ufs::backends::remote::drs::DrsUfs::new(transport);
    let fs = ufs::bridge::AtomicToDescriptor::new(store);

    let a = UfsPath::new("/a.bin");
    let b = UfsPath::new("/b.bin");
    fs.put(&a, b"identical content").unwrap();
    fs.put(&b, b"identical content").unwrap();

    assert_eq!(
        blob_puts.load(std::sync::atomic::Ordering::SeqCst),
        1,
        "two paths with identical bytes share one stored blob"
    );

    let hash_a = fs.info(&a).unwrap().extra.get("sha256").cloned().unwrap();
    assert_eq!(hash_a, hash_bytes(b"identical content"));

    fs.put(&a, b"different now").unwrap();
    let hash_a2 = fs.info(&a).unwrap().extra.get("sha256").cloned().unwrap();
    assert_ne!(hash_a, hash_a2);
    assert_eq!(fs.cat(&b).unwrap(), b"identical content", "b's blob is untouched");
}

#[test]
fn cross_store_mapper_routes_and_reports_synthetic_directories() {
    let docs: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
    let scratch: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
    docs.put(&UfsPath::new("/readme.txt"), b"doc contents").unwrap();
    scratch.put(&UfsPath::new("/tmp.dat"), b"scratch contents").unwrap();

    let mut mapper = Mapper::new();
    mapper.mount("/docs", docs);
    mapper.mount("/var/scratch", scratch);

    assert_eq!(mapper.cat(&UfsPath::new("/docs/readme.txt")).unwrap(), b"doc contents");
    assert_eq!(mapper.cat(&UfsPath::new("/var/scratch/tmp.dat")).unwrap(), b"scratch contents");

    // "/var" has no mount of its own but has a mounted descendant.
    assert!(mapper.info(&UfsPath::new("/var")).unwrap().is_dir());
    assert_eq!(mapper.ls(&UfsPath::new("/var")).unwrap(), vec!["scratch"]);

    assert!(matches!(
        mapper.info(&UfsPath::new("/nowhere")),
        Err(FsError::NotFound { .. })
    ));
}

/// A large-array-like workload: write a big buffer once, then reopen and
/// mutate interior slices repeatedly, the way a chunked dataset format
/// would poke at a backing file across many short-lived handles.
#[test]
fn reopen_and_mutate_interior_slices_of_a_large_file() {
    let dir = tempdir().unwrap();
    let fs = LocalUfs::new(dir.path());
    let path = UfsPath::new("/dataset.bin");

    let initial = vec![0u8; 4096];
    fs.put(&path, &initial).unwrap();

    for chunk in 0..8 {
        let h = fs.open(&path, Mode::READ_UPDATE, None).unwrap();
        let offset = chunk * 512;
        fs.seek(h, offset as i64, Whence::Start).unwrap();
        let marker = vec![chunk as u8; 512];
        fs.write(h, &marker).unwrap();
        fs.close(h).unwrap();
    }

    let out = fs.cat(&path).unwrap();
    assert_eq!(out.len(), 4096);
    for chunk in 0..8 {
        let start = chunk * 512;
        assert!(out[start..start + 512].iter().all(|&b| b == chunk as u8));
    }
}

#[test]
fn walk_and_copytree_mirror_a_tree_between_independent_stores() {
    let src = MemoryUfs::new();
    src.mkdir(&UfsPath::new("/a")).unwrap();
    src.put(&UfsPath::new("/a/one.txt"), b"1").unwrap();
    src.mkdir(&UfsPath::new("/a/b")).unwrap();
    src.put(&UfsPath::new("/a/b/two.txt"), b"2").unwrap();

    let dst = MemoryUfs::new();
    ops::copytree(&src, &UfsPath::new("/a"), &dst, &UfsPath::new("/a"), true).unwrap();

    let src_paths: BTreeSet<_> = ops::walk(&src, &UfsPath::new("/a"), true).unwrap().into_iter().map(|e| e.path).collect();
    let dst_paths: BTreeSet<_> = ops::walk(&dst, &UfsPath::new("/a"), true).unwrap().into_iter().map(|e| e.path).collect();
    assert_eq!(src_paths, dst_paths);
    assert_eq!(dst.cat(&UfsPath::new("/a/b/two.txt")).unwrap(), b"2");
}
