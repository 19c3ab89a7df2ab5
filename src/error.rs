//! # Error taxonomy
//!
//! The lingua franca every backend normalizes into, and every adapter
//! re-translates out of (POSIX errno, SFTP status, HTTP status, ...).
//!
//! ## Example
//!
//! ```rust
//! use ufs::{FsError, UfsPath};
//!
//! let err = FsError::NotFound { path: UfsPath::new("/missing.txt") };
//! assert!(err.to_string().contains("/missing.txt"));
//! ```

use crate::path::UfsPath;

/// A filesystem-contract error.
///
/// Deterministic variants (`NotFound`, `AlreadyExists`, `NotADirectory`,
/// `IsADirectory`, `NotEmpty`) carry the offending path. `Unsupported`
/// marks an operation that cannot be implemented against a given backend
/// (e.g. seeking backwards on an atomic remote). `Io` wraps everything
/// else: transport failures, partial reads, corrupted responses.
///
/// Marked `#[non_exhaustive]`; match with a wildcard arm.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// The path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: UfsPath,
    },

    /// The path already exists when the operation required it not to.
    #[error("already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: UfsPath,
    },

    /// Expected a directory but found a file.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The offending path.
        path: UfsPath,
    },

    /// Expected a file but found a directory.
    #[error("is a directory: {path}")]
    IsADirectory {
        /// The offending path.
        path: UfsPath,
    },

    /// A directory removal was attempted on a non-empty directory.
    #[error("directory not empty: {path}")]
    NotEmpty {
        /// The non-empty directory.
        path: UfsPath,
    },

    /// Authentication or authorization failed.
    #[error("permission denied: {path:?}")]
    PermissionDenied {
        /// The path, when known.
        path: Option<UfsPath>,
    },

    /// The operation is not implementable against this backend.
    #[error("unsupported: {operation} ({detail})")]
    Unsupported {
        /// The operation that is not supported.
        operation: &'static str,
        /// A short explanation (e.g. "atomic backend cannot seek").
        detail: String,
    },

    /// Everything else: transport failures, partial reads, corrupted
    /// responses — wraps the underlying cause.
    #[error("io error: {source}")]
    Io {
        /// The underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl FsError {
    /// Wrap an arbitrary error as `FsError::Io`.
    pub fn io(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        FsError::Io {
            source: Box::new(source),
        }
    }

    /// Build an `Io` variant for a bad/closed handle.
    pub fn bad_handle(handle: u64) -> Self {
        FsError::Io {
            source: Box::new(std::io::Error::other(format!("bad handle: {handle}"))),
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound {
                path: UfsPath::root(),
            },
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists {
                path: UfsPath::root(),
            },
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path: None },
            _ => FsError::Io {
                source: Box::new(err),
            },
        }
    }
}
