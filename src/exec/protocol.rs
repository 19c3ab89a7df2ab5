//! # Request/response protocol
//!
//! The message shapes shared by every execution combinator that crosses a
//! boundary narrower than a function call: [`super::sync_to_async::SyncToAsync`]
//! and [`super::async_to_sync::AsyncToSync`] send these across an in-process
//! channel; [`super::process::Process`] and [`super::socket`] serialize them
//! (`serde_json`, feature `serde`) across a pipe or socket framed with
//! [`tokio_util::codec::LengthDelimitedCodec`].

use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{FileStat, Mode, Whence};

/// One UFS operation, as sent across a bridge.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Request {
    /// See [`crate::contract::Ufs::ls`].
    Ls { path: UfsPath },
    /// See [`crate::contract::Ufs::info`].
    Info { path: UfsPath },
    /// See [`crate::contract::Ufs::open`].
    Open {
        path: UfsPath,
        mode: Mode,
        size_hint: Option<u64>,
    },
    /// See [`crate::contract::Ufs::seek`].
    Seek { handle: u64, pos: i64, whence: Whence },
    /// See [`crate::contract::Ufs::read`].
    Read { handle: u64, n: usize },
    /// See [`crate::contract::Ufs::write`].
    Write { handle: u64, data: Vec<u8> },
    /// See [`crate::contract::Ufs::truncate`].
    Truncate { handle: u64, len: u64 },
    /// See [`crate::contract::Ufs::close`].
    Close { handle: u64 },
    /// See [`crate::contract::Ufs::unlink`].
    Unlink { path: UfsPath },
    /// See [`crate::contract::Ufs::mkdir`].
    Mkdir { path: UfsPath },
    /// See [`crate::contract::Ufs::rmdir`].
    Rmdir { path: UfsPath },
    /// See [`crate::contract::Ufs::flush`].
    Flush { handle: u64 },
    /// See [`crate::contract::Ufs::start`].
    Start,
    /// See [`crate::contract::Ufs::stop`].
    Stop,
}

/// The matching reply to a [`Request`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Response {
    Ls(Vec<String>),
    Info(FileStat),
    Open(u64),
    Seek(u64),
    Read(Vec<u8>),
    Write(usize),
    Unit,
}

/// A wire-safe projection of [`FsError`].
///
/// `FsError::Io` boxes an arbitrary `dyn Error`, which can't round-trip
/// through serde; crossing a process/socket boundary always loses the
/// offending path for `Io` and collapses every deterministic variant's
/// detail to a display string, kept here rather than on `FsError` itself
/// so the in-process contract stays exact.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WireError {
    pub kind: &'static str,
    pub message: String,
}

impl From<&FsError> for WireError {
    fn from(err: &FsError) -> Self {
        let kind = match err {
            FsError::NotFound { .. } => "not_found",
            FsError::AlreadyExists { .. } => "already_exists",
            FsError::NotADirectory { .. } => "not_a_directory",
            FsError::IsADirectory { .. } => "is_a_directory",
            FsError::NotEmpty { .. } => "not_empty",
            FsError::PermissionDenied { .. } => "permission_denied",
            FsError::Unsupported { .. } => "unsupported",
            _ => "io",
        };
        WireError {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<WireError> for FsError {
    fn from(err: WireError) -> Self {
        match err.kind {
            "not_found" => FsError::NotFound { path: UfsPath::root() },
            "already_exists" => FsError::AlreadyExists { path: UfsPath::root() },
            "not_a_directory" => FsError::NotADirectory { path: UfsPath::root() },
            "is_a_directory" => FsError::IsADirectory { path: UfsPath::root() },
            "not_empty" => FsError::NotEmpty { path: UfsPath::root() },
            "permission_denied" => FsError::PermissionDenied { path: None },
            _ => FsError::io(std::io::Error::other(err.message)),
        }
    }
}

/// Pairs a [`Request`] or `Result<Response, WireError>` with the task id
/// that routes a reply back to its caller when completions can arrive out
/// of submission order.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope<T> {
    pub task_id: u64,
    pub body: T,
}

/// Dispatch `request` against any sync [`crate::contract::Ufs`], producing
/// a wire-safe result. Shared by every bridge that owns a sync store on
/// one side of the wire.
pub fn dispatch<B: crate::contract::Ufs>(inner: &B, request: Request) -> Result<Response, WireError> {
    let result = match request {
        Request::Ls { path } => inner.ls(&path).map(Response::Ls),
        Request::Info { path } => inner.info(&path).map(Response::Info),
        Request::Open {
            path,
            mode,
            size_hint,
        } => inner.open(&path, mode, size_hint).map(Response::Open),
        Request::Seek { handle, pos, whence } => inner.seek(handle, pos, whence).map(Response::Seek),
        Request::Read { handle, n } => inner.read(handle, n).map(Response::Read),
        Request::Write { handle, data } => inner.write(handle, &data).map(Response::Write),
        Request::Truncate { handle, len } => inner.truncate(handle, len).map(|_| Response::Unit),
        Request::Close { handle } => inner.close(handle).map(|_| Response::Unit),
        Request::Unlink { path } => inner.unlink(&path).map(|_| Response::Unit),
        Request::Mkdir { path } => inner.mkdir(&path).map(|_| Response::Unit),
        Request::Rmdir { path } => inner.rmdir(&path).map(|_| Response::Unit),
        Request::Flush { handle } => inner.flush(handle).map(|_| Response::Unit),
        Request::Start => inner.start().map(|_| Response::Unit),
        Request::Stop => inner.stop().map(|_| Response::Unit),
    };
    result.map_err(|e| WireError::from(&e))
}

/// Dispatch `request` against any [`crate::contract::asynch::AsyncUfs`],
/// producing a wire-safe result. The async mirror of [`dispatch`], used by
/// bridges with an async store on one side of the wire.
pub async fn dispatch_async<B: crate::contract::asynch::AsyncUfs>(
    inner: &B,
    request: Request,
) -> Result<Response, WireError> {
    let result = match request {
        Request::Ls { path } => inner.ls(&path).await.map(Response::Ls),
        Request::Info { path } => inner.info(&path).await.map(Response::Info),
        Request::Open {
            path,
            mode,
            size_hint,
        } => inner.open(&path, mode, size_hint).await.map(Response::Open),
        Request::Seek { handle, pos, whence } => inner.seek(handle, pos, whence).await.map(Response::Seek),
        Request::Read { handle, n } => inner.read(handle, n).await.map(Response::Read),
        Request::Write { handle, data } => inner.write(handle, &data).await.map(Response::Write),
        Request::Truncate { handle, len } => inner.truncate(handle, len).await.map(|_| Response::Unit),
        Request::Close { handle } => inner.close(handle).await.map(|_| Response::Unit),
        Request::Unlink { path } => inner.unlink(&path).await.map(|_| Response::Unit),
        Request::Mkdir { path } => inner.mkdir(&path).await.map(|_| Response::Unit),
        Request::Rmdir { path } => inner.rmdir(&path).await.map(|_| Response::Unit),
        Request::Flush { handle } => inner.flush(handle).await.map(|_| Response::Unit),
        Request::Start => inner.start().await.map(|_| Response::Unit),
        Request::Stop => inner.stop().await.map(|_| Response::Unit),
    };
    result.map_err(|e| WireError::from(&e))
}

/// Length-delimited, `serde_json`-encoded framing over an async duplex
/// stream (a socket, or a child process's stdio pipes). Shared by
/// [`super::process::Process`] and [`super::socket`].
#[cfg(feature = "serde")]
pub struct FrameIo<S> {
    io: S,
    codec: tokio_util::codec::LengthDelimitedCodec,
    read_buf: bytes::BytesMut,
}

#[cfg(feature = "serde")]
impl<S> FrameIo<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    /// Wrap `io`, framing messages with a 4-byte length prefix.
    pub fn new(io: S) -> Self {
        Self {
            io,
            codec: tokio_util::codec::LengthDelimitedCodec::new(),
            read_buf: bytes::BytesMut::new(),
        }
    }

    /// Serialize `value` as JSON and write it as one length-prefixed frame.
    pub async fn send<T: serde::Serialize>(&mut self, value: &T) -> Result<(), FsError> {
        use tokio_util::codec::Encoder;
        let payload = serde_json::to_vec(value).map_err(FsError::io)?;
        let mut framed = bytes::BytesMut::new();
        self.codec
            .encode(bytes::Bytes::from(payload), &mut framed)
            .map_err(FsError::io)?;
        tokio::io::AsyncWriteExt::write_all(&mut self.io, &framed)
            .await
            .map_err(FsError::from)
    }

    /// Read and JSON-decode the next length-prefixed frame.
    pub async fn recv<T: serde::de::DeserializeOwned>(&mut self) -> Result<T, FsError> {
        use tokio_util::codec::Decoder;
        loop {
            if let Some(frame) = self.codec.decode(&mut self.read_buf).map_err(FsError::io)? {
                return serde_json::from_slice(&frame).map_err(FsError::io);
            }
            let mut chunk = [0u8; 4096];
            let n = tokio::io::AsyncReadExt::read(&mut self.io, &mut chunk)
                .await
                .map_err(FsError::from)?;
            if n == 0 {
                return Err(FsError::io(std::io::Error::other("connection closed")));
            }
            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;
    use crate::contract::Ufs;

    #[test]
    fn dispatch_roundtrips_put_then_cat() {
        let fs = MemoryUfs::new();
        let path = UfsPath::new("/a.txt");
        let open = dispatch(
            &fs,
            Request::Open {
                path: path.clone(),
                mode: Mode::WRITE,
                size_hint: Some(5),
            },
        )
        .unwrap();
        let Response::Open(handle) = open else { panic!("expected Open") };
        dispatch(
            &fs,
            Request::Write {
                handle,
                data: b"hello".to_vec(),
            },
        )
        .unwrap();
        dispatch(&fs, Request::Close { handle }).unwrap();
        assert_eq!(fs.cat(&path).unwrap(), b"hello");
    }

    #[test]
    fn wire_error_roundtrips_kind() {
        let original = FsError::NotFound {
            path: UfsPath::new("/missing"),
        };
        let wire = WireError::from(&original);
        let restored: FsError = wire.into();
        assert!(matches!(restored, FsError::NotFound { .. }));
    }
}
