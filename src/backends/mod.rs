//! # Leaf backends
//!
//! Stores that talk to real storage rather than wrapping another [`crate::contract::Ufs`].
//! `memory` and `local` implement the full descriptor contract directly;
//! `remote` holds the atomic (cat/put-only) family bridged onto it via
//! [`crate::bridge`].

mod local;
mod memory;

pub use local::LocalUfs;
pub use memory::MemoryUfs;

pub mod remote;
