//! # `Process` — drive a UFS server child process over stdio
//!
//! Spawns a child process that runs the matching server loop on its own
//! stdin/stdout and speaks the same framed protocol as
//! [`super::socket::SocketClient`]/[`super::socket::SocketServer`], just
//! over pipes instead of a TCP socket. The child is typically another
//! invocation of this crate's own server binaries, told what to mount via
//! the environment variables below rather than a command-line flag, so the
//! spawning side doesn't need to know the child's argument grammar.

#![cfg(feature = "serde")]

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::Join;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;

use super::protocol::{dispatch_async, Envelope, FrameIo, Request, Response, WireError};
use crate::contract::asynch::AsyncUfs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

/// Environment variable naming the serialized `StoreDescriptor` a spawned
/// server process should mount.
pub const UFS_DESCRIPTOR: &str = "UFS_DESCRIPTOR";
/// Environment variable naming the host directory a FUSE/fallback mount
/// should appear at.
pub const UFS_MOUNT_DIR: &str = "UFS_MOUNT_DIR";
/// Environment variable naming the address a socket/SFTP/HTTP server
/// should bind to.
pub const UFS_BIND_ADDR: &str = "UFS_BIND_ADDR";
/// Environment variable naming the externally-reachable URL a server
/// advertises for itself (e.g. in a DRS manifest).
pub const UFS_PUBLIC_URL: &str = "UFS_PUBLIC_URL";

type Duplex = Join<ChildStdout, ChildStdin>;

/// Drives a long-lived child process implementing the UFS wire protocol on
/// its stdio pipes, presented as an [`AsyncUfs`].
pub struct Process {
    child: Mutex<Child>,
    io: Mutex<FrameIo<Duplex>>,
    next_task: AtomicU64,
}

impl Process {
    /// Spawn `command` with piped stdio and speak the UFS protocol over it.
    pub async fn spawn(mut command: tokio::process::Command) -> Result<Self, FsError> {
        command.stdin(Stdio::piped()).stdout(Stdio::piped());
        let mut child = command.spawn()?;
        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");
        let duplex = tokio::io::join(stdout, stdin);
        Ok(Self {
            child: Mutex::new(child),
            io: Mutex::new(FrameIo::new(duplex)),
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
        debug_assert_eq!(reply.task_id, task_id, "process replies are strictly in order");
        reply.body.map_err(FsError::from)
    }

    /// Wait for the child process to exit. Callers should `stop()` first.
    pub async fn wait(&self) -> Result<std::process::ExitStatus, FsError> {
        self.child.lock().await.wait().await.map_err(FsError::from)
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
impl AsyncUfs for Process {
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
        AccessScope::Process
    }
}

/// Serve `inner` over a duplex stdio-shaped stream, reading one
/// [`Envelope<Request>`] per frame and replying with the matching
/// [`Envelope<Result<Response, WireError>>`] — the loop a child spawned by
/// [`Process::spawn`] should run on its own stdin/stdout.
pub async fn serve<B, S>(inner: &B, io: S) -> Result<(), FsError>
where
    B: crate::contract::Ufs,
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut io = FrameIo::new(io);
    loop {
        let envelope: Envelope<Request> = match io.recv().await {
            Ok(e) => e,
            Err(_) => return Ok(()),
        };
        let body = super::protocol::dispatch(inner, envelope.body);
        io.send(&Envelope {
            task_id: envelope.task_id,
            body,
        })
        .await?;
    }
}

/// The async-store mirror of [`serve`].
pub async fn serve_async<B, S>(inner: &B, io: S) -> Result<(), FsError>
where
    B: AsyncUfs,
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut io = FrameIo::new(io);
    loop {
        let envelope: Envelope<Request> = match io.recv().await {
            Ok(e) => e,
            Err(_) => return Ok(()),
        };
        let body = dispatch_async(inner, envelope.body).await;
        io.send(&Envelope {
            task_id: envelope.task_id,
            body,
        })
        .await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_names_are_stable() {
        assert_eq!(UFS_DESCRIPTOR, "UFS_DESCRIPTOR");
        assert_eq!(UFS_MOUNT_DIR, "UFS_MOUNT_DIR");
        assert_eq!(UFS_BIND_ADDR, "UFS_BIND_ADDR");
        assert_eq!(UFS_PUBLIC_URL, "UFS_PUBLIC_URL");
    }
}
