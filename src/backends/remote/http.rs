//! # `HttpBlobUfs` — an HTTP-addressed atomic store
//!
//! The remote family's fully worked exemplar. No HTTP client lives in the
//! teacher's or pack's dependency stack (`axum`/`hyper` are server-side
//! only); rather than hard-depending on an untested client crate, the wire
//! call is expressed generically over [`HttpTransport`] so a consumer
//! plugs in whichever client (or mock, for tests) they already use.

use crate::bridge::AtomicBackend;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat};

/// The handful of HTTP verbs an atomic blob store needs.
///
/// Implement this against `reqwest`, `ureq`, or any other client; `ufs`
/// itself only ever calls through the trait.
pub trait HttpTransport: Send + Sync {
    /// `GET` the object at `url`.
    fn get(&self, url: &str) -> Result<Vec<u8>, FsError>;
    /// `PUT` `body` at `url`. `size_hint`, when given, becomes
    /// `Content-Length`.
    fn put(&self, url: &str, body: &[u8], size_hint: Option<u64>) -> Result<(), FsError>;
    /// `DELETE` the object at `url`.
    fn delete(&self, url: &str) -> Result<(), FsError>;
    /// `HEAD` the object at `url`, returning its length if it exists.
    fn head(&self, url: &str) -> Result<Option<u64>, FsError>;
    /// List the names of objects directly under the `url` prefix.
    fn list(&self, url: &str) -> Result<Vec<String>, FsError>;
}

/// An atomic store addressed by `{base_url}{path}`.
pub struct HttpBlobUfs<T> {
    transport: T,
    base_url: String,
}

impl<T: HttpTransport> HttpBlobUfs<T> {
    /// A store rooted at `base_url` (no trailing slash), driven by `transport`.
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, path: &UfsPath) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl<T: HttpTransport> AtomicBackend for HttpBlobUfs<T> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.transport.list(&self.url_for(path))
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        match self.transport.head(&self.url_for(path))? {
            Some(len) => Ok(FileStat::file(len)),
            None => Err(FsError::NotFound { path: path.clone() }),
        }
    }

    fn get(&self, path: &UfsPath) -> Result<Vec<u8>, FsError> {
        self.transport.get(&self.url_for(path))
    }

    fn put(&self, path: &UfsPath, data: &[u8], size_hint: Option<u64>) -> Result<(), FsError> {
        self.transport.put(&self.url_for(path), data, size_hint)
    }

    fn delete(&self, path: &UfsPath) -> Result<(), FsError> {
        self.transport.delete(&self.url_for(path))
    }

    fn mkdir(&self, _path: &UfsPath) -> Result<(), FsError> {
        // A flat blob namespace has no real directories; the prefix alone
        // is enough for `ls` to find children once an object exists under
        // it, so there's nothing to create.
        Ok(())
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        if self.transport.list(&self.url_for(path))?.is_empty() {
            Ok(())
        } else {
            Err(FsError::NotEmpty { path: path.clone() })
        }
    }

    fn scope(&self) -> AccessScope {
        AccessScope::Universe
    }
}
