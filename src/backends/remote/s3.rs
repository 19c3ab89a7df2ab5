//! # `S3Ufs` — an S3-addressed atomic store
//!
//! Same shape as [`super::http::HttpBlobUfs`]. S3 has no directories at
//! all, only key prefixes: `mkdir` is a no-op exactly like the HTTP blob
//! case, and `rmdir` only succeeds when no key happens to share the
//! prefix — there is no directory-existed-at-all state to check, which
//! is the quirk worth calling out against the FTP sibling.

use crate::bridge::AtomicBackend;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat};

/// The handful of S3 operations an atomic store needs.
pub trait S3Transport: Send + Sync {
    /// `GetObject`.
    fn get_object(&self, key: &str) -> Result<Vec<u8>, FsError>;
    /// `PutObject`.
    fn put_object(&self, key: &str, body: &[u8], size_hint: Option<u64>) -> Result<(), FsError>;
    /// `DeleteObject`.
    fn delete_object(&self, key: &str) -> Result<(), FsError>;
    /// `HeadObject`, returning the content length if the key exists.
    fn head_object(&self, key: &str) -> Result<Option<u64>, FsError>;
    /// `ListObjectsV2` with `delimiter=/`, returning immediate child names.
    fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, FsError>;
}

/// An atomic store over an S3-compatible bucket, keyed by `UfsPath`
/// rendered without its leading slash.
pub struct S3Ufs<T> {
    transport: T,
}

impl<T: S3Transport> S3Ufs<T> {
    /// A store driven by `transport`, already bound to one bucket.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn key_for(&self, path: &UfsPath) -> String {
        path.to_string().trim_start_matches('/').to_string()
    }
}

impl<T: S3Transport> AtomicBackend for S3Ufs<T> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.transport.list_prefix(&self.key_for(path))
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        match self.transport.head_object(&self.key_for(path))? {
            Some(len) => Ok(FileStat::file(len)),
            None => Err(FsError::NotFound { path: path.clone() }),
        }
    }

    fn get(&self, path: &UfsPath) -> Result<Vec<u8>, FsError> {
        self.transport.get_object(&self.key_for(path))
    }

    fn put(&self, path: &UfsPath, data: &[u8], size_hint: Option<u64>) -> Result<(), FsError> {
        self.transport.put_object(&self.key_for(path), data, size_hint)
    }

    fn delete(&self, path: &UfsPath) -> Result<(), FsError> {
        self.transport.delete_object(&self.key_for(path))
    }

    fn mkdir(&self, _path: &UfsPath) -> Result<(), FsError> {
        Ok(())
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        if self.transport.list_prefix(&self.key_for(path))?.is_empty() {
            Ok(())
        } else {
            Err(FsError::NotEmpty { path: path.clone() })
        }
    }

    fn scope(&self) -> AccessScope {
        AccessScope::Universe
    }
}
