//! # `DrsUfs` — a content-addressed store
//!
//! Data is addressed by its SHA-256 digest; a separate path→hash manifest
//! (kept in [`DrsTransport`]) resolves `UfsPath`s to blobs. Directory
//! hashing sorts children lexicographically by name before hashing
//! (pinned in `DESIGN.md`), so the same tree always hashes to the same
//! digest regardless of insertion order.

use sha2::{Digest, Sha256};

use crate::bridge::AtomicBackend;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat};

/// The path→hash manifest and blob store a [`DrsUfs`] is built on.
pub trait DrsTransport: Send + Sync {
    /// Fetch a blob by its hex digest.
    fn get_blob(&self, hash: &str) -> Result<Vec<u8>, FsError>;
    /// Store a blob under its hex digest. Idempotent: storing the same
    /// hash twice with the same bytes is a no-op.
    fn put_blob(&self, hash: &str, data: &[u8]) -> Result<(), FsError>;
    /// Resolve a path to the digest bound to it, if any.
    fn resolve(&self, path: &str) -> Result<Option<String>, FsError>;
    /// Bind a path to a digest, replacing any previous binding.
    fn bind(&self, path: &str, hash: &str) -> Result<(), FsError>;
    /// Remove a path's binding.
    fn unbind(&self, path: &str) -> Result<(), FsError>;
    /// List the names of paths bound directly under `path`.
    fn children(&self, path: &str) -> Result<Vec<String>, FsError>;
}

/// The content digest of a file's bytes, as used for blob addressing.
pub fn hash_bytes(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    hex_encode(&digest)
}

/// The content digest of a directory, computed over its children sorted
/// lexicographically by name — see the module doc for why sorting matters.
pub fn hash_directory(children: &[(String, String)]) -> String {
    let mut sorted = children.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let mut hasher = Sha256::new();
    for (name, hash) in &sorted {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(hash.as_bytes());
        hasher.update([0u8]);
    }
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// A content-addressed atomic store.
pub struct DrsUfs<T> {
    transport: T,
}

impl<T: DrsTransport> DrsUfs<T> {
    /// A store driven by `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: DrsTransport> AtomicBackend for DrsUfs<T> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.transport.children(&path.to_string())
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        match self.transport.resolve(&path.to_string())? {
            Some(hash) => {
                let bytes = self.transport.get_blob(&hash)?;
                let mut stat = FileStat::file(bytes.len() as u64);
                stat.extra.insert("sha256".to_string(), hash);
                Ok(stat)
            }
            None => Err(FsError::NotFound { path: path.clone() }),
        }
    }

    fn get(&self, path: &UfsPath) -> Result<Vec<u8>, FsError> {
        let hash = self
            .transport
            .resolve(&path.to_string())?
            .ok_or_else(|| FsError::NotFound { path: path.clone() })?;
        self.transport.get_blob(&hash)
    }

    fn put(&self, path: &UfsPath, data: &[u8], _size_hint: Option<u64>) -> Result<(), FsError> {
        let hash = hash_bytes(data);
        self.transport.put_blob(&hash, data)?;
        self.transport.bind(&path.to_string(), &hash)
    }

    fn delete(&self, path: &UfsPath) -> Result<(), FsError> {
        self.transport.unbind(&path.to_string())
    }

    fn mkdir(&self, _path: &UfsPath) -> Result<(), FsError> {
        Ok(())
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        if self.transport.children(&path.to_string())?.is_empty() {
            Ok(())
        } else {
            Err(FsError::NotEmpty { path: path.clone() })
        }
    }

    fn scope(&self) -> AccessScope {
        AccessScope::Universe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_hash_is_order_independent() {
        let a = vec![("b.txt".to_string(), "h2".to_string()), ("a.txt".to_string(), "h1".to_string())];
        let b = vec![("a.txt".to_string(), "h1".to_string()), ("b.txt".to_string(), "h2".to_string())];
        assert_eq!(hash_directory(&a), hash_directory(&b));
    }

    #[test]
    fn directory_hash_changes_with_content() {
        let a = vec![("a.txt".to_string(), "h1".to_string())];
        let b = vec![("a.txt".to_string(), "h2".to_string())];
        assert_ne!(hash_directory(&a), hash_directory(&b));
    }

    #[test]
    fn hash_bytes_is_deterministic() {
        assert_eq!(hash_bytes(b"hello"), hash_bytes(b"hello"));
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"world"));
    }
}
