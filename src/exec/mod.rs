//! # Execution combinators
//!
//! Bridge a [`crate::contract::Ufs`] and a [`crate::contract::asynch::AsyncUfs`]
//! across an execution boundary: a thread ([`sync_to_async`]/[`async_to_sync`]),
//! no boundary at all ([`simple_async`]), a child process ([`process`]), or
//! a TCP connection ([`socket`]). All but `simple_async` share the same
//! [`protocol`] request/response shapes and the same [`queue`] priority
//! channel.

pub mod async_to_sync;
pub mod process;
pub mod protocol;
pub mod queue;
pub mod simple_async;
pub mod socket;
pub mod sync_to_async;

pub use async_to_sync::AsyncToSync;
pub use simple_async::SimpleAsync;
pub use sync_to_async::SyncToAsync;

#[cfg(feature = "serde")]
pub use process::{Process, UFS_BIND_ADDR, UFS_DESCRIPTOR, UFS_MOUNT_DIR, UFS_PUBLIC_URL};
#[cfg(feature = "serde")]
pub use socket::{SocketClient, SocketServer};
