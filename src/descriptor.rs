//! # Store descriptors
//!
//! A serializable description of a store, per §6: a tagged value with a
//! `cls` discriminant and the store-specific parameters, nesting for
//! combinators (`{cls: "Prefix", ufs: {cls: "Memory"}, prefix: "/x"}`).
//! This is the transport [`crate::exec::process::Process`] and
//! [`crate::exec::socket`] use to spawn a duplicate of a store on the
//! other side of a process/network boundary, and what the FUSE adapter
//! uses to rehydrate a store in its mount subprocess.
//!
//! Remote leaf backends (`backends::remote::*`) are parameterized over a
//! transport trait with no concrete, registry-constructible implementation
//! in this crate — an embedding application supplies its own HTTP/FTP/S3/DRS
//! client. [`to_descriptor`]/[`from_descriptor`] therefore cover the stores
//! this crate can build on its own (`Memory`, `Local`, and the structural/
//! behavioral combinators); a remote leaf is described by
//! [`StoreDescriptor::Opaque`], carrying whatever parameters the embedder's
//! own transport needs, and round-trips through the embedder's own
//! extension of this enum rather than through `from_descriptor`.

#![cfg(feature = "serde")]

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backends::{LocalUfs, MemoryUfs};
use crate::combinators::{DirCache, Logger, Overlay, Prefix};
use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;

/// A serializable description of a store. See the module docs for the
/// nesting convention and the limits of what this crate can rehydrate on
/// its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cls")]
pub enum StoreDescriptor {
    /// [`MemoryUfs`] — no parameters, contents are not preserved across a
    /// respawn.
    Memory,
    /// [`LocalUfs`] rooted at `root`.
    Local {
        /// Host directory the store is rooted at.
        root: String,
    },
    /// [`Prefix`] — `ufs` appears to live at `prefix`.
    Prefix {
        /// The wrapped store's descriptor.
        ufs: Box<StoreDescriptor>,
        /// The path the wrapped store's root is mounted at.
        prefix: String,
    },
    /// [`Overlay`] — `upper` shadows `lower`.
    Overlay {
        /// The writable, shadowing layer.
        upper: Box<StoreDescriptor>,
        /// The read-only base layer.
        lower: Box<StoreDescriptor>,
    },
    /// [`Logger`] — `ufs` with calls traced under `label`.
    Logger {
        /// The wrapped store's descriptor.
        ufs: Box<StoreDescriptor>,
        /// The tracing span label.
        label: String,
    },
    /// [`DirCache`] — `ufs` with directory listings cached for `ttl_secs`.
    DirCache {
        /// The wrapped store's descriptor.
        ufs: Box<StoreDescriptor>,
        /// Cache time-to-live, in seconds. `0` disables positive caching.
        ttl_secs: u64,
        /// Maximum number of cached directory entries.
        max_capacity: u64,
    },
    /// A leaf this crate has no transport for. The embedder's own code is
    /// expected to recognize `kind` and build the matching store itself;
    /// [`from_descriptor`] rejects it with [`FsError::Unsupported`].
    Opaque {
        /// An embedder-defined discriminant (e.g. `"Http"`, `"S3"`, `"Drs"`).
        kind: String,
        /// Embedder-defined parameters, opaque to this crate.
        params: serde_json::Value,
    },
}

/// Rehydrate a [`StoreDescriptor`] into a live, type-erased store.
///
/// Fails with [`FsError::Unsupported`] for [`StoreDescriptor::Opaque`]:
/// this crate has no way to construct a remote leaf's transport on its
/// own, so an embedder needing that must pattern-match the descriptor
/// itself before falling back to this function for the rest of the tree.
pub fn from_descriptor(descriptor: &StoreDescriptor) -> Result<Arc<dyn Ufs>, FsError> {
    Ok(match descriptor {
        StoreDescriptor::Memory => Arc::new(MemoryUfs::new()),
        StoreDescriptor::Local { root } => Arc::new(LocalUfs::new(root)),
        StoreDescriptor::Prefix { ufs, prefix } => {
            let inner = from_descriptor(ufs)?;
            Arc::new(Prefix::new(inner, UfsPath::new(prefix)))
        }
        StoreDescriptor::Overlay { upper, lower } => {
            let upper = from_descriptor(upper)?;
            let lower = from_descriptor(lower)?;
            Arc::new(Overlay::new(upper, lower))
        }
        StoreDescriptor::Logger { ufs, label } => {
            let inner = from_descriptor(ufs)?;
            Arc::new(Logger::new(inner, Box::leak(label.clone().into_boxed_str())))
        }
        StoreDescriptor::DirCache {
            ufs,
            ttl_secs,
            max_capacity,
        } => {
            let inner = from_descriptor(ufs)?;
            Arc::new(DirCache::new(inner, Duration::from_secs(*ttl_secs), *max_capacity))
        }
        StoreDescriptor::Opaque { kind, .. } => {
            return Err(FsError::Unsupported {
                operation: "from_descriptor",
                detail: format!("no built-in transport for leaf kind {kind:?}"),
            })
        }
    })
}

/// Describe a [`LocalUfs`] store for later rehydration via
/// [`from_descriptor`].
pub fn local_descriptor(store: &LocalUfs) -> StoreDescriptor {
    StoreDescriptor::Local {
        root: store.root_display(),
    }
}
