//! # Atomic ↔ descriptor bridge
//!
//! Some backends (content-addressed blob stores, single-shot HTTP PUT
//! targets) only support whole-object `get`/`put`; they have no notion of a
//! seekable, partially-written descriptor. [`AtomicBackend`] captures that
//! narrower capability; [`AtomicToDescriptor`] lifts any `AtomicBackend`
//! into a full [`crate::contract::Ufs`] by staging reads eagerly and
//! writes through a background producer thread, exactly the way a
//! streaming HTTP upload client stages a body before the single PUT fires.
//!
//! An atomic backend has no notion of a handle that is both seekable and
//! writable at once, so `open` rejects any updating mode (`"r+"`/`"a+"`)
//! with `Unsupported`; a caller that genuinely needs read-modify-write
//! against an atomic backend wraps it in `ReadWriteCache` instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread::JoinHandle;

use dashmap::DashMap;

use crate::contract::Ufs;
use crate::error::FsError;
use crate::handle::FIRST_HANDLE;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, OpenMode, Whence};

/// The narrower contract a whole-object store actually offers.
///
/// No handles, no partial writes: every read fetches the full object,
/// every write replaces it. `size_hint` is passed through to backends that
/// need a declared `Content-Length` up front.
pub trait AtomicBackend: Send + Sync {
    /// List a directory's immediate children.
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError>;
    /// Stat a path.
    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError>;
    /// Fetch an object's full bytes.
    fn get(&self, path: &UfsPath) -> Result<Vec<u8>, FsError>;
    /// Replace an object's full bytes.
    fn put(&self, path: &UfsPath, data: &[u8], size_hint: Option<u64>) -> Result<(), FsError>;
    /// Delete an object.
    fn delete(&self, path: &UfsPath) -> Result<(), FsError>;
    /// Create a directory (or directory marker, on backends that need one).
    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError>;
    /// Remove an empty directory.
    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError>;
    /// This backend's access scope.
    fn scope(&self) -> AccessScope;
}

/// A fully seekable, handle-based store — what most of `ufs` is built
/// against. `Ufs` already plays this role; this alias exists so bridge
/// code reads symmetrically with [`AtomicBackend`].
pub trait DescriptorBackend: Ufs {}
impl<T: Ufs> DescriptorBackend for T {}

struct ReadHandle {
    data: Vec<u8>,
    cursor: u64,
}

struct WriteHandle {
    path: UfsPath,
    tx: Option<SyncSender<Vec<u8>>>,
    result_rx: Receiver<Result<(), FsError>>,
    join: Option<JoinHandle<()>>,
}

enum Handle {
    Read(ReadHandle),
    Write(WriteHandle),
}

/// Channel depth for the write-side producer pipe. Bounded so a slow
/// backend applies backpressure to the writer rather than buffering an
/// unbounded amount of memory.
const WRITE_PIPE_DEPTH: usize = 8;

/// Lifts an [`AtomicBackend`] into the full [`Ufs`] contract.
///
/// Reads fetch the whole object on `open` and serve it out of memory.
/// Writes spawn a background thread that accumulates chunks sent over a
/// bounded channel and issues a single `put` when the handle is closed;
/// `seek`/`truncate` on a write handle are `Unsupported` since the
/// backend can't reposition inside an in-flight upload.
pub struct AtomicToDescriptor<B: AtomicBackend + 'static> {
    backend: std::sync::Arc<B>,
    handles: DashMap<u64, Handle>,
    next_id: AtomicU64,
}

impl<B: AtomicBackend + 'static> AtomicToDescriptor<B> {
    /// Wrap an atomic backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend: std::sync::Arc::new(backend),
            handles: DashMap::new(),
            next_id: AtomicU64::new(FIRST_HANDLE),
        }
    }

    fn alloc(&self, handle: Handle) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handles.insert(id, handle);
        id
    }

    fn spawn_writer(&self, path: UfsPath, preload: Vec<u8>, size_hint: Option<u64>) -> WriteHandle {
        let (tx, rx) = sync_channel::<Vec<u8>>(WRITE_PIPE_DEPTH);
        let (result_tx, result_rx) = sync_channel::<Result<(), FsError>>(1);
        let backend = self.backend.clone();
        let thread_path = path.clone();
        let join = std::thread::spawn(move || {
            let mut buf = preload;
            while let Ok(chunk) = rx.recv() {
                buf.extend_from_slice(&chunk);
            }
            let result = backend.put(&thread_path, &buf, size_hint);
            let _ = result_tx.send(result);
        });
        WriteHandle {
            path,
            tx: Some(tx),
            result_rx,
            join: Some(join),
        }
    }
}

impl<B: AtomicBackend + 'static> Ufs for AtomicToDescriptor<B> {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        self.backend.ls(path)
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        self.backend.info(path)
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        if mode.updating {
            return Err(FsError::Unsupported {
                operation: "open",
                detail: "atomic backends have no seekable read+write handle; wrap in ReadWriteCache for \"r+\"/\"a+\""
                    .into(),
            });
        }
        match mode.kind {
            OpenMode::Read => {
                let data = self.backend.get(path)?;
                Ok(self.alloc(Handle::Read(ReadHandle { data, cursor: 0 })))
            }
            OpenMode::Write => {
                let wh = self.spawn_writer(path.clone(), Vec::new(), size_hint);
                Ok(self.alloc(Handle::Write(wh)))
            }
            OpenMode::Append => {
                let existing = match self.backend.get(path) {
                    Ok(bytes) => bytes,
                    Err(FsError::NotFound { .. }) => Vec::new(),
                    Err(e) => return Err(e),
                };
                if !existing.is_empty() && size_hint.is_some() {
                    return Err(FsError::Unsupported {
                        operation: "open(append)",
                        detail: "size_hint on append to an existing atomic object is not supported"
                            .into(),
                    });
                }
                let wh = self.spawn_writer(path.clone(), existing, size_hint);
                Ok(self.alloc(Handle::Write(wh)))
            }
        }
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        let mut entry = self.handles.get_mut(&handle).ok_or_else(|| FsError::bad_handle(handle))?;
        match &mut *entry {
            Handle::Read(rh) => {
                let base = match whence {
                    Whence::Start => 0i64,
                    Whence::Current => rh.cursor as i64,
                    Whence::End => rh.data.len() as i64,
                };
                rh.cursor = (base + pos).max(0) as u64;
                Ok(rh.cursor)
            }
            Handle::Write(_) => Err(FsError::Unsupported {
                operation: "seek",
                detail: "cannot seek within an in-flight atomic write".into(),
            }),
        }
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        let mut entry = self.handles.get_mut(&handle).ok_or_else(|| FsError::bad_handle(handle))?;
        match &mut *entry {
            Handle::Read(rh) => {
                let start = (rh.cursor as usize).min(rh.data.len());
                let end = (start + n).min(rh.data.len());
                let chunk = rh.data[start..end].to_vec();
                rh.cursor = end as u64;
                Ok(chunk)
            }
            Handle::Write(_) => Err(FsError::Unsupported {
                operation: "read",
                detail: "handle opened for writing".into(),
            }),
        }
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        let entry = self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?;
        match &*entry {
            Handle::Write(wh) => {
                let tx = wh.tx.as_ref().expect("write handle always has a live sender");
                tx.send(data.to_vec())
                    .map_err(|_| FsError::io(std::io::Error::other("atomic writer thread exited early")))?;
                Ok(data.len())
            }
            Handle::Read(_) => Err(FsError::Unsupported {
                operation: "write",
                detail: "handle opened for reading".into(),
            }),
        }
    }

    fn truncate(&self, handle: u64, _len: u64) -> Result<(), FsError> {
        match self.handles.get(&handle).ok_or_else(|| FsError::bad_handle(handle))?.value() {
            Handle::Read(_) => Err(FsError::Unsupported {
                operation: "truncate",
                detail: "read handle cannot be truncated".into(),
            }),
            Handle::Write(_) => Err(FsError::Unsupported {
                operation: "truncate",
                detail: "cannot truncate an in-flight atomic write; close and re-open".into(),
            }),
        }
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        let (_, entry) = self.handles.remove(&handle).ok_or_else(|| FsError::bad_handle(handle))?;
        match entry {
            Handle::Read(_) => Ok(()),
            Handle::Write(mut wh) => {
                drop(wh.tx.take());
                let result = wh
                    .result_rx
                    .recv()
                    .unwrap_or_else(|_| Err(FsError::io(std::io::Error::other("atomic writer thread panicked"))));
                if let Some(join) = wh.join.take() {
                    let _ = join.join();
                }
                tracing::trace!(path = %wh.path, ok = result.is_ok(), "atomic write committed");
                result
            }
        }
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        self.backend.delete(path)
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.backend.mkdir(path)
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        self.backend.rmdir(path)
    }

    fn scope(&self) -> AccessScope {
        self.backend.scope()
    }
}
