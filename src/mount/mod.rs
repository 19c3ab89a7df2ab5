//! # Mount runtime
//!
//! [`fuse`] projects a [`crate::contract::Ufs`] into a real kernel mount
//! when the store's [`crate::stat::AccessScope`] is at least `System`;
//! [`fallback`] provides the same surface via a scratch-directory mirror
//! for stores below that scope.

#[cfg(feature = "fuse-mount")]
pub mod fuse;

pub mod fallback;
