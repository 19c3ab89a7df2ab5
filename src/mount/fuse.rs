//! # `fuser::Filesystem` over any [`Ufs`]
//!
//! Grounded on `fuser`'s own `passthrough` example: `Filesystem` methods
//! return `Result<_, Errno>` directly rather than consuming a reply object,
//! so this module is a thin inode-table layer over [`OsAdapter`] rather
//! than a hand-rolled reply-sender.
//!
//! inode 1 is always the mount root. Every other inode is allocated the
//! first time a path is `lookup`'d or created, and stays stable for the
//! life of the mount (no inode reuse/forget bookkeeping — acceptable for
//! a VFS surface that does not claim POSIX hard-link semantics).

#![cfg(feature = "fuse-mount")]

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use fuser::{Dirent, DirentList, Entry, Errno, FileAttr, FileType, Filesystem, KernelConfig, Open, RequestMeta};

use crate::adapters::os_adapter::OsAdapter;
use crate::contract::Ufs;
use crate::path::UfsPath;
use crate::stat::{FileStat, Mode};

const TTL: Duration = Duration::from_secs(1);
const ROOT_INO: u64 = 1;

/// Mounts any [`Ufs`] at a host directory via FUSE.
///
/// Readonly mode rejects every write-shaped call with `EPERM` before it
/// reaches the wrapped store.
pub struct FuseFs<B> {
    adapter: OsAdapter<B>,
    readonly: bool,
    inodes: DashMap<u64, UfsPath>,
    paths: DashMap<UfsPath, u64>,
    next_ino: AtomicU64,
}

impl<B: Ufs> FuseFs<B> {
    /// Mount `inner` read-write.
    pub fn new(inner: B) -> Self {
        Self::with_readonly(inner, false)
    }

    /// Mount `inner`, optionally rejecting every write with `EPERM`.
    pub fn with_readonly(inner: B, readonly: bool) -> Self {
        let inodes = DashMap::new();
        let paths = DashMap::new();
        inodes.insert(ROOT_INO, UfsPath::root());
        paths.insert(UfsPath::root(), ROOT_INO);
        Self {
            adapter: OsAdapter::new(inner),
            readonly,
            inodes,
            paths,
            next_ino: AtomicU64::new(ROOT_INO + 1),
        }
    }

    fn ino_for(&self, path: &UfsPath) -> u64 {
        if let Some(ino) = self.paths.get(path) {
            return *ino;
        }
        let ino = self.next_ino.fetch_add(1, Ordering::SeqCst);
        self.paths.insert(path.clone(), ino);
        self.inodes.insert(ino, path.clone());
        ino
    }

    fn path_for(&self, ino: u64) -> Result<UfsPath, Errno> {
        self.inodes.get(&ino).map(|e| e.clone()).ok_or(Errno::ESTALE)
    }

    fn attr(&self, ino: u64, stat: &FileStat) -> FileAttr {
        let secs = |t: Option<f64>| t.map(|s| UNIX_EPOCH + Duration::from_secs_f64(s)).unwrap_or(UNIX_EPOCH);
        FileAttr {
            ino,
            size: stat.size,
            blocks: stat.size.div_ceil(512),
            atime: secs(stat.atime),
            mtime: secs(stat.mtime),
            ctime: secs(stat.ctime),
            crtime: UNIX_EPOCH,
            kind: if stat.is_dir() { FileType::Directory } else { FileType::RegularFile },
            perm: if stat.is_dir() { 0o755 } else { 0o644 },
            nlink: 1,
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
            rdev: 0,
            blksize: 512,
            flags: 0,
        }
    }

    fn deny_if_readonly(&self) -> Result<(), Errno> {
        if self.readonly {
            Err(Errno::EPERM)
        } else {
            Ok(())
        }
    }

    fn name_to_str(name: &Path) -> Result<&str, Errno> {
        name.to_str().ok_or(Errno::EINVAL)
    }
}

impl<B: Ufs> Filesystem for FuseFs<B> {
    fn init(&mut self, _req: RequestMeta, config: KernelConfig) -> Result<KernelConfig, Errno> {
        Ok(config)
    }

    fn lookup(&mut self, _req: RequestMeta, parent: u64, name: &Path) -> Result<Entry, Errno> {
        let parent_path = self.path_for(parent)?;
        let child = parent_path.join_name(Self::name_to_str(name)?);
        let stat = self.adapter.info(&child)?;
        let ino = self.ino_for(&child);
        Ok(Entry {
            ino,
            generation: None,
            file_ttl: TTL,
            attr: self.attr(ino, &stat),
            attr_ttl: TTL,
        })
    }

    fn getattr(&mut self, _req: RequestMeta, ino: u64, _fh: Option<u64>) -> Result<(FileAttr, Duration), Errno> {
        let path = self.path_for(ino)?;
        let stat = self.adapter.info(&path)?;
        Ok((self.attr(ino, &stat), TTL))
    }

    fn open(&mut self, _req: RequestMeta, ino: u64, flags: i32) -> Result<Open, Errno> {
        let path = self.path_for(ino)?;
        let write_requested = flags & (libc::O_WRONLY | libc::O_RDWR) != 0;
        if write_requested {
            self.deny_if_readonly()?;
        }
        let mode = match flags & libc::O_ACCMODE {
            libc::O_WRONLY => Mode::WRITE,
            libc::O_RDWR => Mode::READ_UPDATE,
            _ => Mode::READ,
        };
        let handle = self.adapter.open(&path, mode, None)?;
        Ok(Open { fh: handle, flags: 0 })
    }

    fn opendir(&mut self, _req: RequestMeta, ino: u64, _flags: i32) -> Result<Open, Errno> {
        let path = self.path_for(ino)?;
        self.adapter.info(&path)?;
        Ok(Open { fh: 0, flags: 0 })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read<'a>(
        &mut self,
        _req: RequestMeta,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
    ) -> Result<Bytes<'a>, Errno> {
        self.adapter.seek(fh, offset, crate::stat::Whence::Start)?;
        let data = self.adapter.read(fh, size as usize)?;
        Ok(Bytes::Owned(data))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write(
        &mut self,
        _req: RequestMeta,
        _ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
    ) -> Result<u32, Errno> {
        self.deny_if_readonly()?;
        self.adapter.seek(fh, offset, crate::stat::Whence::Start)?;
        let n = self.adapter.write(fh, data)?;
        Ok(n as u32)
    }

    fn release(
        &mut self,
        _req: RequestMeta,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
    ) -> Result<(), Errno> {
        self.adapter.close(fh)
    }

    fn releasedir(&mut self, _req: RequestMeta, _ino: u64, _fh: u64, _flags: i32) -> Result<(), Errno> {
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn readdir<'dir, 'name>(
        &mut self,
        _req: RequestMeta,
        ino: u64,
        _fh: u64,
        offset: i64,
        _max_bytes: u32,
    ) -> Result<DirentList<'dir, 'name>, Errno> {
        let path = self.path_for(ino)?;
        let names = self.adapter.ls(&path)?;
        let mut entries = vec![
            Dirent {
                ino,
                offset: 1,
                kind: FileType::Directory,
                name: Bytes::Owned(b".".to_vec()),
            },
            Dirent {
                ino,
                offset: 2,
                kind: FileType::Directory,
                name: Bytes::Owned(b"..".to_vec()),
            },
        ];
        for (i, name) in names.into_iter().enumerate() {
            let child = path.join_name(&name);
            let stat = self.adapter.info(&child)?;
            let child_ino = self.ino_for(&child);
            entries.push(Dirent {
                ino: child_ino,
                offset: 3 + i as i64,
                kind: if stat.is_dir() { FileType::Directory } else { FileType::RegularFile },
                name: Bytes::Owned(name.into_bytes()),
            });
        }
        let remaining: Vec<_> = entries.into_iter().filter(|e| e.offset > offset).collect();
        Ok(DirentList::from(remaining))
    }

    fn mkdir(&mut self, _req: RequestMeta, parent: u64, name: &Path, _mode: u32, _umask: u32) -> Result<Entry, Errno> {
        self.deny_if_readonly()?;
        let parent_path = self.path_for(parent)?;
        let child = parent_path.join_name(Self::name_to_str(name)?);
        self.adapter.mkdir(&child)?;
        let stat = self.adapter.info(&child)?;
        let ino = self.ino_for(&child);
        Ok(Entry {
            ino,
            generation: None,
            file_ttl: TTL,
            attr: self.attr(ino, &stat),
            attr_ttl: TTL,
        })
    }

    fn create(
        &mut self,
        _req: RequestMeta,
        parent: u64,
        name: &Path,
        _mode: u32,
        _umask: u32,
        _flags: i32,
    ) -> Result<(Entry, Open), Errno> {
        self.deny_if_readonly()?;
        let parent_path = self.path_for(parent)?;
        let child = parent_path.join_name(Self::name_to_str(name)?);
        let handle = self.adapter.open(&child, Mode::WRITE, None)?;
        let stat = self.adapter.info(&child)?;
        let ino = self.ino_for(&child);
        let entry = Entry {
            ino,
            generation: None,
            file_ttl: TTL,
            attr: self.attr(ino, &stat),
            attr_ttl: TTL,
        };
        Ok((entry, Open { fh: handle, flags: 0 }))
    }

    fn unlink(&mut self, _req: RequestMeta, parent: u64, name: &Path) -> Result<(), Errno> {
        self.deny_if_readonly()?;
        let parent_path = self.path_for(parent)?;
        let child = parent_path.join_name(Self::name_to_str(name)?);
        self.adapter.unlink(&child)?;
        if let Some((_, ino)) = self.paths.remove(&child) {
            self.inodes.remove(&ino);
        }
        Ok(())
    }

    fn rmdir(&mut self, _req: RequestMeta, parent: u64, name: &Path) -> Result<(), Errno> {
        self.deny_if_readonly()?;
        let parent_path = self.path_for(parent)?;
        let child = parent_path.join_name(Self::name_to_str(name)?);
        self.adapter.rmdir(&child)?;
        if let Some((_, ino)) = self.paths.remove(&child) {
            self.inodes.remove(&ino);
        }
        Ok(())
    }
}

/// Re-exported so this module's signatures match `fuser`'s own without
/// every caller needing a separate `use fuser::Bytes`.
pub use fuser::Bytes;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    fn dummy_meta() -> RequestMeta {
        RequestMeta {
            unique: 0,
            uid: 1000,
            gid: 1000,
            pid: 2000,
        }
    }

    #[test]
    fn lookup_getattr_and_read_a_file() {
        let fs_store = MemoryUfs::new();
        fs_store.put(&UfsPath::new("/a.txt"), b"hello").unwrap();
        let mut fs = FuseFs::new(fs_store);

        let entry = fs.lookup(dummy_meta(), ROOT_INO, Path::new("a.txt")).unwrap();
        assert_eq!(entry.attr.size, 5);

        let (attr, _ttl) = fs.getattr(dummy_meta(), entry.ino, None).unwrap();
        assert_eq!(attr.kind, FileType::RegularFile);

        let open = fs.open(dummy_meta(), entry.ino, libc::O_RDONLY).unwrap();
        let data = fs.read(dummy_meta(), entry.ino, open.fh, 0, 1024, 0, None).unwrap();
        assert_eq!(&*data, b"hello");
    }

    #[test]
    fn readonly_mount_rejects_writes() {
        let mut fs = FuseFs::with_readonly(MemoryUfs::new(), true);
        let err = fs.mkdir(dummy_meta(), ROOT_INO, Path::new("sub"), 0o755, 0).unwrap_err();
        assert_eq!(err, Errno::EPERM);
    }

    #[test]
    fn mkdir_then_readdir_sees_new_entry() {
        let mut fs = FuseFs::new(MemoryUfs::new());
        fs.mkdir(dummy_meta(), ROOT_INO, Path::new("sub"), 0o755, 0).unwrap();
        let entries = fs.readdir(dummy_meta(), ROOT_INO, 0, 0, 4096).unwrap();
        let names: Vec<_> = entries.iter().map(|e| String::from_utf8_lossy(&e.name).into_owned()).collect();
        assert!(names.contains(&"sub".to_string()));
    }
}
