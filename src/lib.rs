//! # ufs
//!
//! A composable Universal File System abstraction: one POSIX-like contract
//! ([`contract::Ufs`]) over in-memory storage, local disk, and remote
//! services (HTTP, FTP, S3, DRS-like content-addressed stores), with
//! caching, overlay, and cross-process combinators layered on top the same
//! way `tower` layers a `Service`.
//!
//! ---
//!
//! ## Quick start
//!
//! ```rust
//! use ufs::{Ufs, UfsPath, backends::MemoryUfs};
//!
//! fn work_with_files<B: Ufs>(store: &B) -> Result<(), ufs::FsError> {
//!     store.put(&UfsPath::new("/input.txt"), b"payload")?;
//!     let data = store.cat(&UfsPath::new("/input.txt"))?;
//!     store.put(&UfsPath::new("/output.txt"), &data)?;
//!     store.mkdir(&UfsPath::new("/archive"))?;
//!     for name in store.ls(&UfsPath::new("/"))? {
//!         println!("{name}");
//!     }
//!     Ok(())
//! }
//!
//! work_with_files(&MemoryUfs::new()).unwrap();
//! ```
//!
//! ## Crate organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`contract`] | The core [`Ufs`] (sync) and [`contract::asynch::AsyncUfs`] (async) traits |
//! | [`path`] | [`UfsPath`], a normalized absolute POSIX-style path |
//! | [`error`] | [`FsError`], the taxonomy every adapter translates to/from |
//! | [`stat`] | [`FileStat`], [`stat::AccessScope`], [`stat::Mode`], [`stat::Whence`] |
//! | [`handle`] | The open-handle table leaf backends build their descriptor semantics on |
//! | [`backends`] | Leaf stores: [`backends::MemoryUfs`], [`backends::LocalUfs`], `backends::remote::*` |
//! | [`bridge`] | Lifts an atomic (whole-object) backend into a full [`Ufs`] |
//! | [`combinators`] | Structural and behavioral combinators that wrap one [`Ufs`] in another |
//! | [`layer`] | `tower`-style `.layer(...)` composition for combinators |
//! | [`exec`] | Execution combinators bridging sync/async and process/network boundaries |
//! | [`adapters`] | Shape adapters: path-like, POSIX/errno-like, map-like |
//! | [`mount`] | Real FUSE mount, and a fallback for stores that cannot be kernel-mounted |
//! | [`servers`] | SFTP, DRS/HTTP, and socket-RPC server adapters |
//! | [`ops`] | `walk`/`shutil`-style high-level operations built from the contract |
//! | [`descriptor`] | Serializable description of a store, for processes that must rebuild one |
//!
//! ## Thread safety
//!
//! [`Ufs`] requires `Send + Sync`. Methods take `&self`; backends use
//! interior mutability (a `DashMap`-guarded handle table, a `parking_lot`
//! lock around in-memory state) so a store can be shared behind an `Arc`
//! and driven from multiple threads without an external lock.
//!
//! ## Feature flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` (default) | Serialization for stat/path types, [`descriptor::StoreDescriptor`], and the `exec` wire protocol |
//! | `cli` | The `ufs-mount` binary |
//! | `fuse-mount` | Real kernel mounts via `fuser` ([`mount::fuse`]) and the POSIX-shaped [`adapters::os_adapter::OsAdapter`] |
//! | `sftp-server` | [`servers::sftp`] |
//! | `http-server` | [`servers::drs_http`] |
//! | `socket-rpc` | [`servers::rpc`] / [`exec::socket`] |

pub mod adapters;
pub mod backends;
pub mod bridge;
pub mod combinators;
pub mod contract;
pub mod descriptor;
pub mod error;
pub mod exec;
pub mod handle;
pub mod layer;
pub mod mount;
pub mod ops;
pub mod path;
pub mod servers;
pub mod stat;

pub use contract::Ufs;
pub use error::FsError;
pub use handle::{HandleEntry, HandleTable};
pub use layer::{Layer, LayerExt};
pub use ops::{walk, WalkEntry};
pub use path::UfsPath;
pub use stat::{AccessScope, EntryType, FileStat, Mode, OpenMode, Whence};
