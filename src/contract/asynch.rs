//! # The UFS contract — asynchronous shape
//!
//! The suspending mirror of [`crate::contract::Ufs`]. Every I/O-bearing
//! operation may suspend; pure helpers never do. The two shapes are
//! interconvertible via the execution combinators in [`crate::exec`].

use async_trait::async_trait;

use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

use super::CHUNK_SIZE;

/// The asynchronous UFS contract.
///
/// Mirrors [`crate::contract::Ufs`] method-for-method; see there for the
/// contract each operation must honor.
#[async_trait]
pub trait AsyncUfs: Send + Sync {
    /// See [`crate::contract::Ufs::ls`].
    async fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError>;
    /// See [`crate::contract::Ufs::info`].
    async fn info(&self, path: &UfsPath) -> Result<FileStat, FsError>;
    /// See [`crate::contract::Ufs::open`].
    async fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>)
    -> Result<u64, FsError>;
    /// See [`crate::contract::Ufs::seek`].
    async fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError>;
    /// See [`crate::contract::Ufs::read`].
    async fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError>;
    /// See [`crate::contract::Ufs::write`].
    async fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError>;
    /// See [`crate::contract::Ufs::truncate`].
    async fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError>;
    /// See [`crate::contract::Ufs::close`].
    async fn close(&self, handle: u64) -> Result<(), FsError>;
    /// See [`crate::contract::Ufs::unlink`].
    async fn unlink(&self, path: &UfsPath) -> Result<(), FsError>;
    /// See [`crate::contract::Ufs::mkdir`].
    async fn mkdir(&self, path: &UfsPath) -> Result<(), FsError>;
    /// See [`crate::contract::Ufs::rmdir`].
    async fn rmdir(&self, path: &UfsPath) -> Result<(), FsError>;

    /// See [`crate::contract::Ufs::flush`].
    async fn flush(&self, handle: u64) -> Result<(), FsError> {
        let _ = handle;
        Ok(())
    }

    /// See [`crate::contract::Ufs::start`].
    async fn start(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// See [`crate::contract::Ufs::stop`].
    async fn stop(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// See [`crate::contract::Ufs::scope`].
    fn scope(&self) -> AccessScope;

    /// See [`crate::contract::Ufs::cat`].
    async fn cat(&self, path: &UfsPath) -> Result<Vec<u8>, FsError> {
        let info = self.info(path).await?;
        if !info.is_file() {
            return Err(FsError::IsADirectory { path: path.clone() });
        }
        let handle = self.open(path, Mode::READ, None).await?;
        let mut buf = Vec::with_capacity(info.size as usize);
        loop {
            let chunk = self.read(handle, CHUNK_SIZE).await?;
            if chunk.is_empty() {
                break;
            }
            buf.extend_from_slice(&chunk);
        }
        self.close(handle).await?;
        Ok(buf)
    }

    /// See [`crate::contract::Ufs::put`].
    async fn put(&self, path: &UfsPath, data: &[u8]) -> Result<(), FsError> {
        let handle = self.open(path, Mode::WRITE, Some(data.len() as u64)).await?;
        let mut written = 0;
        while written < data.len() {
            let n = self.write(handle, &data[written..]).await?;
            if n == 0 {
                break;
            }
            written += n;
        }
        self.close(handle).await?;
        Ok(())
    }

    /// See [`crate::contract::Ufs::copy`].
    async fn copy(&self, src: &UfsPath, dst: &UfsPath) -> Result<(), FsError> {
        let data = self.cat(src).await?;
        self.put(dst, &data).await
    }

    /// See [`crate::contract::Ufs::rename`].
    async fn rename(&self, src: &UfsPath, dst: &UfsPath) -> Result<(), FsError> {
        self.copy(src, dst).await?;
        self.unlink(src).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;
    use crate::exec::simple_async::SimpleAsync;

    #[tokio::test]
    async fn cat_put_roundtrip_via_defaults() {
        let fs = SimpleAsync::new(MemoryUfs::new());
        let path = UfsPath::new("/a.txt");
        AsyncUfs::put(&fs, &path, b"hello async").await.unwrap();
        assert_eq!(AsyncUfs::cat(&fs, &path).await.unwrap(), b"hello async");
    }

    #[tokio::test]
    async fn copy_then_rename_defaults() {
        let fs = SimpleAsync::new(MemoryUfs::new());
        let src = UfsPath::new("/src.txt");
        let dst = UfsPath::new("/dst.txt");
        AsyncUfs::put(&fs, &src, b"payload").await.unwrap();
        AsyncUfs::copy(&fs, &src, &dst).await.unwrap();
        AsyncUfs::rename(&fs, &dst, &UfsPath::new("/dst2.txt"))
            .await
            .unwrap();
        assert!(AsyncUfs::info(&fs, &dst).await.is_err());
        assert_eq!(
            AsyncUfs::cat(&fs, &UfsPath::new("/dst2.txt")).await.unwrap(),
            b"payload"
        );
    }
}
