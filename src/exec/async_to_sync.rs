//! # `AsyncToSync` — drive an async [`AsyncUfs`] from sync callers
//!
//! The mirror of [`super::sync_to_async::SyncToAsync`]: owns the async
//! store on a dedicated thread that runs its own current-thread Tokio
//! runtime, and exposes a plain sync [`Ufs`] to callers that block on
//! `std::sync::mpsc` instead of suspending.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use dashmap::DashMap;

use super::protocol::{dispatch_async, Request, Response, WireError};
use super::queue::PriorityQueue;
use crate::contract::asynch::AsyncUfs;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

type Reply = mpsc::Sender<Result<Response, WireError>>;

/// Runs an [`AsyncUfs`] on a dedicated thread with its own current-thread
/// Tokio runtime, presented as a sync [`Ufs`].
pub struct AsyncToSync {
    queue: Arc<PriorityQueue<(u64, Request)>>,
    pending: Arc<DashMap<u64, Reply>>,
    next_task: AtomicU64,
    worker: Option<std::thread::JoinHandle<()>>,
    scope: AccessScope,
}

impl AsyncToSync {
    /// Spawn a dedicated thread+runtime driving `inner`.
    pub fn spawn<B: AsyncUfs + 'static>(inner: B) -> Self {
        let scope = inner.scope();
        let queue: Arc<PriorityQueue<(u64, Request)>> = Arc::new(PriorityQueue::new());
        let pending: Arc<DashMap<u64, Reply>> = Arc::new(DashMap::new());

        let worker_queue = queue.clone();
        let worker_pending = pending.clone();
        let worker = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("build current-thread runtime");
            while let Some((task_id, request)) = worker_queue.pop() {
                let response = rt.block_on(dispatch_async(&inner, request));
                if let Some((_, tx)) = worker_pending.remove(&task_id) {
                    let _ = tx.send(response);
                }
            }
        });

        Self {
            queue,
            pending,
            next_task: AtomicU64::new(0),
            worker: Some(worker),
            scope,
        }
    }

    fn call(&self, priority: i32, request: Request) -> Result<Response, FsError> {
        let task_id = self.next_task.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel();
        self.pending.insert(task_id, tx);
        self.queue.push(priority, (task_id, request));
        rx.recv()
            .map_err(|_| FsError::io(std::io::Error::other("async worker thread gone")))?
            .map_err(FsError::from)
    }
}

impl Drop for AsyncToSync {
    fn drop(&mut self) {
        self.queue.close();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

macro_rules! unit_reply {
    ($result:expr) => {
        match $result? {
            Response::Unit => Ok(()),
            _ => unreachable!("dispatch_async always returns the matching variant"),
        }
    };
}

impl Ufs for AsyncToSync {
    fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        match self.call(0, Request::Ls { path: path.clone() })? {
            Response::Ls(names) => Ok(names),
            _ => unreachable!(),
        }
    }

    fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        match self.call(0, Request::Info { path: path.clone() })? {
            Response::Info(stat) => Ok(stat),
            _ => unreachable!(),
        }
    }

    fn open(&self, path: &UfsPath, mode: Mode, size_hint: Option<u64>) -> Result<u64, FsError> {
        let request = Request::Open {
            path: path.clone(),
            mode,
            size_hint,
        };
        match self.call(0, request)? {
            Response::Open(handle) => Ok(handle),
            _ => unreachable!(),
        }
    }

    fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        match self.call(0, Request::Seek { handle, pos, whence })? {
            Response::Seek(pos) => Ok(pos),
            _ => unreachable!(),
        }
    }

    fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        match self.call(0, Request::Read { handle, n })? {
            Response::Read(data) => Ok(data),
            _ => unreachable!(),
        }
    }

    fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        let request = Request::Write {
            handle,
            data: data.to_vec(),
        };
        match self.call(0, request)? {
            Response::Write(n) => Ok(n),
            _ => unreachable!(),
        }
    }

    fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Truncate { handle, len }))
    }

    fn close(&self, handle: u64) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Close { handle }))
    }

    fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Unlink { path: path.clone() }))
    }

    fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Mkdir { path: path.clone() }))
    }

    fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Rmdir { path: path.clone() }))
    }

    fn flush(&self, handle: u64) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Flush { handle }))
    }

    fn start(&self) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Start))
    }

    fn stop(&self) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Stop))
    }

    fn scope(&self) -> AccessScope {
        self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;
    use crate::exec::simple_async::SimpleAsync;

    #[test]
    fn put_then_cat_via_dedicated_runtime() {
        let fs = AsyncToSync::spawn(SimpleAsync::new(MemoryUfs::new()));
        let path = UfsPath::new("/a.txt");
        fs.put(&path, b"through a runtime").unwrap();
        assert_eq!(fs.cat(&path).unwrap(), b"through a runtime");
    }

    #[test]
    fn scope_passes_through_from_inner() {
        let fs = AsyncToSync::spawn(SimpleAsync::new(MemoryUfs::new()));
        assert_eq!(fs.scope(), AccessScope::Thread);
    }
}
