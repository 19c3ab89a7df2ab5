//! # Socket RPC server
//!
//! The §4.12 "socket RPC server" is [`crate::exec::socket::SocketServer`]:
//! the framed request/response protocol of §4.8 accepting connections over
//! TCP. Re-exported here under `servers` so the three server adapters
//! (SFTP, DRS/HTTP, socket RPC) are discoverable from one place.

#![cfg(feature = "socket-rpc")]

pub use crate::exec::socket::SocketServer;
