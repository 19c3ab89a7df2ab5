//! # Server adapters
//!
//! Expose a [`crate::contract::Ufs`] to an external protocol: [`sftp`] for
//! SFTP clients, [`drs_http`] for a DRS/HTTP read/write surface, [`rpc`] for
//! the framed socket protocol of §4.8.

#[cfg(feature = "sftp-server")]
pub mod sftp;

#[cfg(feature = "http-server")]
pub mod drs_http;

#[cfg(feature = "socket-rpc")]
pub mod rpc;
