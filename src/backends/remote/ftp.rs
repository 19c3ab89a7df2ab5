//! # `FtpUfs` — an FTP-addressed atomic store
//!
//! Same shape as [`super::http::HttpBlobUfs`], against an [`FtpTransport`]
//! instead of an HTTP client. FTP's own `LIST`/`MLSD` already distinguish
//! files from directories, so unlike the flat HTTP blob namespace,
//! `mkdir`/`rmdir` here are real operations rather than no-ops — the
//! quirk worth documenting for this sibling.

use crate::bridge::AtomicBackend;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat};

/// The handful of FTP verbs an atomic store needs.
pub trait FtpTransport: Send + Sync {
    /// `RETR` the file at `path`.
    fn retrieve(&self, path: &str) -> Result<Vec<u8>, FsError>;
    /// `STOR` `data` at `path`.
    fn store(&self, path: &str, data: &[u8]) -> Result<(), FsError>;
    /// `DELE` the file at `path`.
    fn delete(&self, path: &str) -> Result<(), FsError>;
    /// `MKD` the directory at `path`.
    fn make_dir(&self, path: &str) -> Result<(), FsError>;
    /// `RMD` the directory at `path`.
    fn remove_dir(&self, path: &str) -> Result<(), FsError>;
    /// `MLSD`/`LIST` a directory's immediate children.
    fn list(&self, path: &str) -> Result<Vec<String>, FsError>;
    /// `SIZE` a path, if it names a file.
    fn size(&self, path: &str) -> Result<Option<u64>, FsError>;
}

/// An atomic store over an FTP session.
pub struct FtpUfs<T> {
    transport: T,
}

impl<T: FtpTransport> FtpUfs<T> {
    /// A store driven by an already-connected `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: FtpTransport> AtomicBackend for FtpUfs<T> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.transport.list(&path.to_string())
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        match self.transport.size(&path.to_string())? {
            Some(len) => Ok(FileStat::file(len)),
            None => Err(FsError::NotFound { path: path.clone() }),
        }
    }

    fn get(&self, path: &UfsPath) -> Result<Vec<u8>, FsError> {
        self.transport.retrieve(&path.to_string())
    }

    fn put(&self, path: &UfsPath, data: &[u8], _size_hint: Option<u64>) -> Result<(), FsError> {
        self.transport.store(&path.to_string(), data)
    }

    fn delete(&self, path: &UfsPath) -> Result<(), FsError> {
        self.transport.delete(&path.to_string())
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.transport.make_dir(&path.to_string())
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.transport.remove_dir(&path.to_string())
    }

    fn scope(&self) -> AccessScope {
        AccessScope::Universe
    }
}
