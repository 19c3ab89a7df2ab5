//! # Shape adapters
//!
//! Project a [`crate::contract::Ufs`] into the shape a particular kind of
//! caller expects: [`path_adapter::PathAdapter`] for `pathlib`-style
//! application code, [`os_adapter::OsAdapter`] for POSIX/errno-speaking
//! mount points and servers, [`map_adapter::MapAdapter`] for config-shaped
//! nested trees.

pub mod map_adapter;
pub mod path_adapter;

#[cfg(feature = "fuse-mount")]
pub mod os_adapter;

pub use map_adapter::{MapAdapter, MapValue};
pub use path_adapter::PathAdapter;

#[cfg(feature = "fuse-mount")]
pub use os_adapter::OsAdapter;
