//! # High-level `walk`/`shutil`-style operations
//!
//! Generic over `&dyn Ufs`, built from the core contract the same way
//! [`crate::contract::Ufs::cat`]/`put` are: no backend needs to implement
//! any of this directly.

use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::FileStat;

/// One entry yielded by [`walk`].
pub struct WalkEntry {
    /// The entry's path.
    pub path: UfsPath,
    /// The entry's stat.
    pub info: FileStat,
}

/// Recursively traverse `root`, yielding every descendant (and `root`
/// itself, if it exists).
///
/// `dirfirst = true` yields a directory before its contents (suitable for
/// copying); `dirfirst = false` yields it after (suitable for deleting).
pub fn walk(store: &dyn Ufs, root: &UfsPath, dirfirst: bool) -> Result<Vec<WalkEntry>, FsError> {
    let info = store.info(root)?;
    let mut out = Vec::new();
    walk_into(store, root, &info, dirfirst, &mut out)?;
    Ok(out)
}

fn walk_into(
    store: &dyn Ufs,
    path: &UfsPath,
    info: &FileStat,
    dirfirst: bool,
    out: &mut Vec<WalkEntry>,
) -> Result<(), FsError> {
    let self_entry = || WalkEntry {
        path: path.clone(),
        info: info.clone(),
    };
    if !info.is_dir() {
        out.push(self_entry());
        return Ok(());
    }
    if dirfirst {
        out.push(self_entry());
    }
    for name in store.ls(path)? {
        let child = path.join_name(name);
        let child_info = store.info(&child)?;
        walk_into(store, &child, &child_info, dirfirst, out)?;
    }
    if !dirfirst {
        out.push(self_entry());
    }
    Ok(())
}

/// Copy one file. If `src_store` and `dst_store` point at the same store,
/// delegates to [`Ufs::copy`]; otherwise streams `cat` into `put`.
pub fn copyfile(
    src_store: &dyn Ufs,
    src_path: &UfsPath,
    dst_store: &dyn Ufs,
    dst_path: &UfsPath,
) -> Result<(), FsError> {
    if std::ptr::eq(src_store, dst_store) {
        return src_store.copy(src_path, dst_path);
    }
    let data = src_store.cat(src_path)?;
    dst_store.put(dst_path, &data)
}

/// Recursively copy `src_root` onto `dst_root`, creating directories as
/// needed. When `exists_ok` is `false`, an existing destination directory
/// fails with `AlreadyExists`.
pub fn copytree(
    src_store: &dyn Ufs,
    src_root: &UfsPath,
    dst_store: &dyn Ufs,
    dst_root: &UfsPath,
    exists_ok: bool,
) -> Result<(), FsError> {
    for entry in walk(src_store, src_root, true)? {
        let relative = entry
            .path
            .strip_prefix(src_root)
            .expect("walk only yields descendants of its root");
        let dst_path = dst_root.join(relative.to_string());
        if entry.info.is_dir() {
            match dst_store.mkdir(&dst_path) {
                Ok(()) => {}
                Err(FsError::AlreadyExists { .. }) if exists_ok => {}
                Err(e) => return Err(e),
            }
        } else {
            copyfile(src_store, &entry.path, dst_store, &dst_path)?;
        }
    }
    Ok(())
}

/// Recursively remove everything under (and including) `root`.
pub fn rmtree(store: &dyn Ufs, root: &UfsPath) -> Result<(), FsError> {
    for entry in walk(store, root, false)? {
        if entry.info.is_dir() {
            store.rmdir(&entry.path)?;
        } else {
            store.unlink(&entry.path)?;
        }
    }
    Ok(())
}

/// Move a single file within one store: `copy` then `unlink` of the
/// source. Refuses a destination under the source.
pub fn movefile(store: &dyn Ufs, src: &UfsPath, dst: &UfsPath) -> Result<(), FsError> {
    reject_self_nesting(src, dst)?;
    store.copy(src, dst)?;
    store.unlink(src)
}

/// Move a file or directory within one store. Files use [`movefile`];
/// directories are [`copytree`]d then [`rmtree`]d.
pub fn move_path(store: &dyn Ufs, src: &UfsPath, dst: &UfsPath) -> Result<(), FsError> {
    reject_self_nesting(src, dst)?;
    if store.info(src)?.is_dir() {
        copytree(store, src, store, dst, false)?;
        rmtree(store, src)
    } else {
        store.copy(src, dst)?;
        store.unlink(src)
    }
}

fn reject_self_nesting(src: &UfsPath, dst: &UfsPath) -> Result<(), FsError> {
    if dst.starts_with(src) {
        return Err(FsError::Unsupported {
            operation: "move",
            detail: format!("destination {dst} is nested under source {src}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    fn sample() -> MemoryUfs {
        let fs = MemoryUfs::new();
        fs.mkdir(&UfsPath::new("/a")).unwrap();
        fs.put(&UfsPath::new("/a/one.txt"), b"1").unwrap();
        fs.mkdir(&UfsPath::new("/a/b")).unwrap();
        fs.put(&UfsPath::new("/a/b/two.txt"), b"2").unwrap();
        fs
    }

    #[test]
    fn walk_dirfirst_orders_directory_before_children() {
        let fs = sample();
        let entries = walk(&fs, &UfsPath::new("/a"), true).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths[0], "/a");
        assert!(paths.iter().position(|p| p == "/a/b").unwrap() < paths.iter().position(|p| p == "/a/b/two.txt").unwrap());
    }

    #[test]
    fn walk_dirlast_orders_children_before_directory() {
        let fs = sample();
        let entries = walk(&fs, &UfsPath::new("/a"), false).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(*paths.last().unwrap(), "/a");
    }

    #[test]
    fn copytree_then_rmtree_roundtrip() {
        let fs = sample();
        copytree(&fs, &UfsPath::new("/a"), &fs, &UfsPath::new("/copy"), false).unwrap();
        assert_eq!(fs.cat(&UfsPath::new("/copy/b/two.txt")).unwrap(), b"2");
        rmtree(&fs, &UfsPath::new("/copy")).unwrap();
        assert!(fs.info(&UfsPath::new("/copy")).is_err());
    }

    #[test]
    fn copytree_across_two_stores() {
        let src = sample();
        let dst = MemoryUfs::new();
        copytree(&src, &UfsPath::new("/a"), &dst, &UfsPath::new("/a"), false).unwrap();
        assert_eq!(dst.cat(&UfsPath::new("/a/one.txt")).unwrap(), b"1");
    }

    #[test]
    fn movefile_relocates_within_one_store() {
        let fs = sample();
        movefile(&fs, &UfsPath::new("/a/one.txt"), &UfsPath::new("/a/moved.txt")).unwrap();
        assert!(fs.info(&UfsPath::new("/a/one.txt")).is_err());
        assert_eq!(fs.cat(&UfsPath::new("/a/moved.txt")).unwrap(), b"1");
    }

    #[test]
    fn move_path_rejects_nesting_under_source() {
        let fs = sample();
        let err = move_path(&fs, &UfsPath::new("/a"), &UfsPath::new("/a/b/nested")).unwrap_err();
        assert!(matches!(err, FsError::Unsupported { .. }));
    }
}
