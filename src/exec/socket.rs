//! # `SocketClient`/`SocketServer` — the wire protocol over TCP
//!
//! The network-reachable sibling of [`super::process::Process`]: same
//! framed request/response protocol, carried over a
//! `tokio::net::TcpStream` instead of a child's stdio pipes. A
//! [`SocketServer`] accepts connections and serves one store to each;
//! [`SocketClient`] dials a server and exposes it as an [`AsyncUfs`].

#![cfg(feature = "serde")]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;

use super::process::{serve, serve_async};
use super::protocol::{Envelope, FrameIo, Request, Response, WireError};
use crate::contract::asynch::AsyncUfs;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// Dials a [`SocketServer`] and presents the remote store as an
/// [`AsyncUfs`].
pub struct SocketClient {
    io: Mutex<FrameIo<TcpStream>>,
    next_task: AtomicU64,
}

impl SocketClient {
    /// Connect to `addr` and speak the UFS protocol over the resulting
    /// stream.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, FsError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            io: Mutex::new(FrameIo::new(stream)),
            next_task: AtomicU64::new(0),
        })
    }

    async fn call(&self, request: Request) -> Result<Response, FsError> {
        let task_id = self.next_task.fetch_add(1, Ordering::SeqCst);
        let mut io = self.io.lock().await;
        io.send(&Envelope {
            task_id,
            body: request,
        })
        .await?;
        let reply: Envelope<Result<Response, WireError>> = io.recv().await?;
        debug_assert_eq!(reply.task_id, task_id, "socket replies are strictly in order");
        reply.body.map_err(FsError::from)
    }
}

macro_rules! unit_reply {
    ($result:expr) => {
        match $result.await? {
            Response::Unit => Ok(()),
            _ => unreachable!("dispatch always returns the matching variant"),
        }
    };
}

#[async_trait]
impl AsyncUfs for SocketClient {
    async fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        match self.call(Request::Ls { path: path.clone() }).await? {
            Response::Ls(names) => Ok(names),
            _ => unreachable!(),
        }
    }

    async fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        match self.call(Request::Info { path: path.clone() }).await? {
            Response::Info(stat) => Ok(stat),
            _ => unreachable!(),
        }
    }

    async fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        let request = Request::Open {
            path: path.clone(),
            mode,
            size_hint,
        };
        match self.call(request).await? {
            Response::Open(handle) => Ok(handle),
            _ => unreachable!(),
        }
    }

    async fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        match self.call(Request::Seek { handle, pos, whence }).await? {
            Response::Seek(pos) => Ok(pos),
            _ => unreachable!(),
        }
    }

    async fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        match self.call(Request::Read { handle, n }).await? {
            Response::Read(data) => Ok(data),
            _ => unreachable!(),
        }
    }

    async fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        let request = Request::Write {
            handle,
            data: data.to_vec(),
        };
        match self.call(request).await? {
            Response::Write(n) => Ok(n),
            _ => unreachable!(),
        }
    }

    async fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        unit_reply!(self.call(Request::Truncate { handle, len }))
    }

    async fn close(&self, handle: u64) -> Result<(), FsError> {
        unit_reply!(self.call(Request::Close { handle }))
    }

    async fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        unit_reply!(self.call(Request::Unlink { path: path.clone() }))
    }

    async fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        unit_reply!(self.call(Request::Mkdir { path: path.clone() }))
    }

    async fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        unit_reply!(self.call(Request::Rmdir { path: path.clone() }))
    }

    async fn flush(&self, handle: u64) -> Result<(), FsError> {
        unit_reply!(self.call(Request::Flush { handle }))
    }

    async fn start(&self) -> Result<(), FsError> {
        unit_reply!(self.call(Request::Start))
    }

    async fn stop(&self) -> Result<(), FsError> {
        unit_reply!(self.call(Request::Stop))
    }

    fn scope(&self) -> AccessScope {
        AccessScope::Universe
    }
}

/// Accepts connections on a bound `TcpListener` and serves one sync
/// [`Ufs`] to each.
pub struct SocketServer;

impl SocketServer {
    /// Bind `addr` and serve `inner` to every connection until the process
    /// is killed or `shutdown` fires. Each connection gets its own
    /// spawned task; `inner` is shared behind the caller's `Arc`.
    pub async fn serve<B: Ufs + 'static>(
        addr: impl ToSocketAddrs,
        inner: Arc<B>,
    ) -> Result<(), FsError> {
        let listener = TcpListener::bind(addr).await?;
        loop {
            let (stream, _) = listener.accept().await?;
            let inner = inner.clone();
            tokio::spawn(async move {
                let _ = serve(&*inner, stream).await;
            });
        }
    }

    /// The async-store mirror of [`SocketServer::serve`].
    pub async fn serve_async<B: AsyncUfs + 'static>(
        addr: impl ToSocketAddrs,
        inner: Arc<B>,
    ) -> Result<(), FsError> {
        let listener = TcpListener::bind(addr).await?;
        loop {
            let (stream, _) = listener.accept().await?;
            let inner = inner.clone();
            tokio::spawn(async move {
                let _ = serve_async(&*inner, stream).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[tokio::test]
    async fn client_server_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(MemoryUfs::new());
        let server_store = store.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let store = server_store.clone();
                tokio::spawn(async move {
                    let _ = serve(&*store, stream).await;
                });
            }
        });

        let client = SocketClient::connect(addr).await.unwrap();
        let path = UfsPath::new("/a.txt");
        AsyncUfs::put(&client, &path, b"over the wire").await.unwrap();
        assert_eq!(AsyncUfs::cat(&client, &path).await.unwrap(), b"over the wire");
        assert_eq!(store.cat(&path).unwrap(), b"over the wire");
    }
}
