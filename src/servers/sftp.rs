//! # SFTP server
//!
//! Serves one [`Ufs`](crate::contract::Ufs) over SFTP: `russh` drives the SSH
//! transport and authentication, `russh-sftp` drives the subsystem protocol,
//! and every filesystem operation is translated through the
//! [`OsAdapter`](crate::adapters::os_adapter::OsAdapter) the same way the
//! FUSE mount (§4.10) is built on it — this is the other POSIX-shaped
//! consumer of that seam. `symlink`/`readlink` are not part of the UFS
//! contract, so both report [`StatusCode::OpUnsupported`].

#![cfg(feature = "sftp-server")]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use russh::server::{Auth, Handler as SshHandler, Msg, Server as SshServer, Session};
use russh::{Channel, ChannelId};
use russh_sftp::protocol::{Attrs, Data, File, FileAttributes, Handle, Name, OpenFlags, Status, StatusCode, Version};
use russh_sftp::server::Handler as SftpHandler;

use crate::adapters::os_adapter::OsAdapter;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{FileStat, Mode, Whence};

/// Credentials an [`SftpServer`] accepts. `password = None` means any
/// password is accepted for that username (host-key-only auth is out of
/// scope — §4.12 asks for username plus an optional password).
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    users: HashMap<String, Option<String>>,
}

impl Credentials {
    /// Start with no accepted users (every auth attempt is rejected).
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `username` with any password.
    pub fn allow_any_password(mut self, username: impl Into<String>) -> Self {
        self.users.insert(username.into(), None);
        self
    }

    /// Accept `username` only with this exact `password`.
    pub fn allow_password(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), Some(password.into()));
        self
    }

    fn check(&self, user: &str, password: &str) -> bool {
        match self.users.get(user) {
            Some(None) => true,
            Some(Some(expected)) => expected == password,
            None => false,
        }
    }
}

/// Accepts SSH connections and serves one store's contents as SFTP to each.
pub struct SftpServer<B> {
    adapter: Arc<OsAdapter<B>>,
    credentials: Arc<Credentials>,
    config: Arc<russh::server::Config>,
}

impl<B: Ufs + 'static> SftpServer<B> {
    /// Wrap `inner` behind the given key/connection `config` and accept only
    /// the given `credentials`.
    pub fn new(inner: B, credentials: Credentials, config: russh::server::Config) -> Self {
        Self {
            adapter: Arc::new(OsAdapter::new(inner)),
            credentials: Arc::new(credentials),
            config: Arc::new(config),
        }
    }

    /// Bind `addr` and serve connections until the process is killed.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> Result<(), FsError> {
        let mut handler = SshServerHandle {
            adapter: self.adapter,
            credentials: self.credentials,
        };
        russh::server::run(self.config, addr.into(), &mut handler)
            .await
            .map_err(|e| FsError::io(std::io::Error::other(e)))
    }
}

#[derive(Clone)]
struct SshServerHandle<B> {
    adapter: Arc<OsAdapter<B>>,
    credentials: Arc<Credentials>,
}

impl<B: Ufs + 'static> SshServer for SshServerHandle<B> {
    type Handler = SshSession<B>;

    fn new_client(&mut self, _peer: Option<SocketAddr>) -> Self::Handler {
        SshSession {
            adapter: self.adapter.clone(),
            credentials: self.credentials.clone(),
        }
    }
}

struct SshSession<B> {
    adapter: Arc<OsAdapter<B>>,
    credentials: Arc<Credentials>,
}

#[async_trait]
impl<B: Ufs + 'static> SshHandler for SshSession<B> {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        Ok(if self.credentials.check(user, password) {
            Auth::Accept
        } else {
            Auth::reject()
        })
    }

    async fn channel_open_session(&mut self, _channel: Channel<Msg>, _session: &mut Session) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn subsystem_request(&mut self, channel: ChannelId, name: &str, session: &mut Session) -> Result<(), Self::Error> {
        if name == "sftp" {
            let sftp = UfsSftpHandler::new(self.adapter.clone());
            session.channel_success(channel)?;
            russh_sftp::server::run(session.handle(), channel, sftp).await;
        } else {
            session.channel_failure(channel)?;
        }
        Ok(())
    }
}

/// Translates a single SFTP session's requests into [`OsAdapter`] calls.
struct UfsSftpHandler<B> {
    adapter: Arc<OsAdapter<B>>,
    version: Option<u32>,
    next_handle: AtomicU64,
    files: DashMap<String, u64>,
    dirs: DashMap<String, Vec<String>>,
}

impl<B: Ufs> UfsSftpHandler<B> {
    fn new(adapter: Arc<OsAdapter<B>>) -> Self {
        Self {
            adapter,
            version: None,
            next_handle: AtomicU64::new(0),
            files: DashMap::new(),
            dirs: DashMap::new(),
        }
    }

    fn alloc_handle(&self) -> String {
        format!("h{}", self.next_handle.fetch_add(1, Ordering::SeqCst))
    }
}

fn to_status_code(err: nix::errno::Errno) -> StatusCode {
    use nix::errno::Errno;
    match err {
        Errno::ENOENT => StatusCode::NoSuchFile,
        Errno::EEXIST | Errno::ENOTEMPTY => StatusCode::Failure,
        Errno::EPERM | Errno::EROFS => StatusCode::PermissionDenied,
        Errno::ENOTSUP => StatusCode::OpUnsupported,
        _ => StatusCode::Failure,
    }
}

fn attrs_of(stat: &FileStat) -> FileAttributes {
    let mut attrs = FileAttributes::default();
    attrs.size = Some(stat.size);
    attrs.mtime = stat.mtime.map(|t| t as u32);
    attrs.atime = stat.atime.map(|t| t as u32);
    attrs.permissions = Some(if stat.is_dir() { 0o40755 } else { 0o100644 });
    attrs
}

#[async_trait]
impl<B: Ufs> SftpHandler for UfsSftpHandler<B> {
    type Error = StatusCode;

    fn unimplemented(&self) -> Self::Error {
        StatusCode::OpUnsupported
    }

    async fn init(&mut self, version: u32, _extensions: HashMap<String, String>) -> Result<Version, Self::Error> {
        self.version = Some(version);
        Ok(Version::new())
    }

    async fn open(&mut self, id: u32, filename: String, pflags: OpenFlags, _attrs: FileAttributes) -> Result<Handle, Self::Error> {
        let path = UfsPath::new(&filename);
        let mode = if pflags.contains(OpenFlags::WRITE) && pflags.contains(OpenFlags::READ) {
            Mode::READ_UPDATE
        } else if pflags.contains(OpenFlags::APPEND) {
            Mode::APPEND
        } else if pflags.contains(OpenFlags::WRITE) {
            Mode::WRITE
        } else {
            Mode::READ
        };
        let fh = self.adapter.open(&path, mode, None).map_err(to_status_code)?;
        let handle = self.alloc_handle();
        self.files.insert(handle.clone(), fh);
        Ok(Handle { id, handle })
    }

    async fn close(&mut self, id: u32, handle: String) -> Result<Status, Self::Error> {
        if let Some((_, fh)) = self.files.remove(&handle) {
            self.adapter.close(fh).map_err(to_status_code)?;
        }
        self.dirs.remove(&handle);
        Ok(Status {
            id,
            status_code: StatusCode::Ok,
            error_message: String::new(),
            language_tag: String::new(),
        })
    }

    async fn read(&mut self, id: u32, handle: String, offset: u64, len: u32) -> Result<Data, Self::Error> {
        let fh = *self.files.get(&handle).ok_or(StatusCode::Failure)?;
        self.adapter.seek(fh, offset as i64, Whence::Start).map_err(to_status_code)?;
        let data = self.adapter.read(fh, len as usize).map_err(to_status_code)?;
        if data.is_empty() {
            return Err(StatusCode::Eof);
        }
        Ok(Data { id, data })
    }

    async fn write(&mut self, id: u32, handle: String, offset: u64, data: Vec<u8>) -> Result<Status, Self::Error> {
        let fh = *self.files.get(&handle).ok_or(StatusCode::Failure)?;
        self.adapter.seek(fh, offset as i64, Whence::Start).map_err(to_status_code)?;
        self.adapter.write(fh, &data).map_err(to_status_code)?;
        Ok(Status {
            id,
            status_code: StatusCode::Ok,
            error_message: String::new(),
            language_tag: String::new(),
        })
    }

    async fn lstat(&mut self, id: u32, path: String) -> Result<Attrs, Self::Error> {
        self.stat(id, path).await
    }

    async fn stat(&mut self, id: u32, path: String) -> Result<Attrs, Self::Error> {
        let info = self.adapter.info(&UfsPath::new(&path)).map_err(to_status_code)?;
        Ok(Attrs {
            id,
            attrs: attrs_of(&info),
        })
    }

    async fn opendir(&mut self, id: u32, path: String) -> Result<Handle, Self::Error> {
        let names = self.adapter.ls(&UfsPath::new(&path)).map_err(to_status_code)?;
        let handle = self.alloc_handle();
        self.dirs.insert(handle.clone(), names);
        Ok(Handle { id, handle })
    }

    async fn readdir(&mut self, id: u32, handle: String) -> Result<Name, Self::Error> {
        let mut remaining = self.dirs.get_mut(&handle).ok_or(StatusCode::Failure)?;
        if remaining.is_empty() {
            return Err(StatusCode::Eof);
        }
        let names: Vec<_> = remaining.drain(..).collect();
        let mut files = Vec::with_capacity(names.len());
        for name in names {
            files.push(File {
                filename: name,
                longname: String::new(),
                attrs: FileAttributes::default(),
            });
        }
        Ok(Name { id, file: files })
    }

    async fn remove(&mut self, id: u32, filename: String) -> Result<Status, Self::Error> {
        self.adapter.unlink(&UfsPath::new(&filename)).map_err(to_status_code)?;
        Ok(Status {
            id,
            status_code: StatusCode::Ok,
            error_message: String::new(),
            language_tag: String::new(),
        })
    }

    async fn mkdir(&mut self, id: u32, path: String, _attrs: FileAttributes) -> Result<Status, Self::Error> {
        self.adapter.mkdir(&UfsPath::new(&path)).map_err(to_status_code)?;
        Ok(Status {
            id,
            status_code: StatusCode::Ok,
            error_message: String::new(),
            language_tag: String::new(),
        })
    }

    async fn rmdir(&mut self, id: u32, path: String) -> Result<Status, Self::Error> {
        self.adapter.rmdir(&UfsPath::new(&path)).map_err(to_status_code)?;
        Ok(Status {
            id,
            status_code: StatusCode::Ok,
            error_message: String::new(),
            language_tag: String::new(),
        })
    }

    async fn rename(&mut self, id: u32, oldpath: String, newpath: String) -> Result<Status, Self::Error> {
        let inner = self.adapter.inner();
        inner
            .rename(&UfsPath::new(&oldpath), &UfsPath::new(&newpath))
            .map_err(|_| StatusCode::Failure)?;
        Ok(Status {
            id,
            status_code: StatusCode::Ok,
            error_message: String::new(),
            language_tag: String::new(),
        })
    }

    async fn realpath(&mut self, id: u32, path: String) -> Result<Name, Self::Error> {
        let normalized = UfsPath::new(&path).to_string();
        Ok(Name {
            id,
            file: vec![File {
                filename: normalized,
                longname: String::new(),
                attrs: FileAttributes::default(),
            }],
        })
    }

    async fn symlink(&mut self, _id: u32, _linkpath: String, _targetpath: String) -> Result<Status, Self::Error> {
        Err(StatusCode::OpUnsupported)
    }

    async fn readlink(&mut self, _id: u32, _path: String) -> Result<Name, Self::Error> {
        Err(StatusCode::OpUnsupported)
    }
}
