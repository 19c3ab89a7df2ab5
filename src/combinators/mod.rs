//! # Combinators
//!
//! Structural combinators (`Prefix`, `Mapper`, `TemporaryDirectory`)
//! reshape the path space a store presents; behavioral combinators
//! (`Overlay`, `Logger`, `DirCache`, `WriteCache`, `ReadWriteCache`) add
//! cross-cutting behavior without changing it. Both kinds wrap an inner
//! [`crate::contract::Ufs`] and implement the same trait, so they compose
//! freely via [`crate::layer::Layer`].

pub mod dircache;
pub mod logger;
pub mod mapper;
pub mod overlay;
pub mod prefix;
pub mod prefix_tree;
pub mod readwritecache;
pub mod tempdir;
pub mod writecache;

pub use dircache::DirCache;
pub use logger::Logger;
pub use mapper::Mapper;
pub use overlay::Overlay;
pub use prefix::Prefix;
pub use readwritecache::ReadWriteCache;
pub use tempdir::TemporaryDirectory;
pub use writecache::WriteCache;

use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;

/// Create `path`'s parent directories in `store`, recursing up from the
/// deepest missing ancestor. Shared by the caching combinators, which
/// stage writes into a store that didn't necessarily mkdir its way there.
pub(crate) fn ensure_parents(store: &impl Ufs, path: &UfsPath) -> Result<(), FsError> {
    let parent = path.parent();
    if parent.is_root() {
        return Ok(());
    }
    match store.info(&parent) {
        Ok(_) => Ok(()),
        Err(FsError::NotFound { .. }) => {
            ensure_parents(store, &parent)?;
            store.mkdir(&parent)
        }
        Err(e) => Err(e),
    }
}
