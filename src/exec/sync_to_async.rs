//! # `SyncToAsync` — run a sync [`Ufs`] on a dedicated thread
//!
//! For a sync backend that genuinely blocks (disk I/O, a blocking remote
//! client), `SyncToAsync` owns it on one dedicated `std::thread` and
//! exposes it as an [`AsyncUfs`]. Calls are submitted on a
//! [`PriorityQueue`] keyed by task id; each gets its own `tokio::sync::oneshot`
//! reply channel so a later, higher-priority call can complete before an
//! earlier one without misrouting replies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::oneshot;

use super::protocol::{dispatch, Request, Response, WireError};
use super::queue::PriorityQueue;
use crate::contract::asynch::AsyncUfs;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;
use crate::stat::{AccessScope, FileStat, Mode, Whence};

type Reply = oneshot::Sender<Result<Response, WireError>>;

/// Runs a sync [`Ufs`] on a dedicated worker thread, presented as an
/// [`AsyncUfs`].
pub struct SyncToAsync {
    queue: Arc<PriorityQueue<(u64, Request)>>,
    pending: Arc<DashMap<u64, Reply>>,
    next_task: AtomicU64,
    worker: Option<std::thread::JoinHandle<()>>,
    scope: AccessScope,
}

impl SyncToAsync {
    /// Spawn a dedicated thread driving `inner`.
    pub fn spawn<B: Ufs + 'static>(inner: B) -> Self {
        let queue: Arc<PriorityQueue<(u64, Request)>> = Arc::new(PriorityQueue::new());
        let pending: Arc<DashMap<u64, Reply>> = Arc::new(DashMap::new());
        let scope = inner.scope();

        let worker_queue = queue.clone();
        let worker_pending = pending.clone();
        let worker = std::thread::spawn(move || {
            while let Some((task_id, request)) = worker_queue.pop() {
                let response = dispatch(&inner, request);
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

    /// Submit `request` at `priority` (lower values serviced first),
    /// awaiting the matching reply.
    async fn call(&self, priority: i32, request: Request) -> Result<Response, FsError> {
        let task_id = self.next_task.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(task_id, tx);
        self.queue.push(priority, (task_id, request));
        rx.await
            .map_err(|_| FsError::io(std::io::Error::other("sync worker thread gone")))?
            .map_err(FsError::from)
    }
}

impl Drop for SyncToAsync {
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
            _ => unreachable!("dispatch always returns the matching variant"),
        }
    };
}

#[async_trait]
impl AsyncUfs for SyncToAsync {
    async fn ls(&self, path: &UfsPath) -> Result<Vec<String>, FsError> {
        match self.call(0, Request::Ls { path: path.clone() }).await? {
            Response::Ls(names) => Ok(names),
            _ => unreachable!(),
        }
    }

    async fn info(&self, path: &UfsPath) -> Result<FileStat, FsError> {
        match self.call(0, Request::Info { path: path.clone() }).await? {
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
        match self.call(0, request).await? {
            Response::Open(handle) => Ok(handle),
            _ => unreachable!(),
        }
    }

    async fn seek(&self, handle: u64, pos: i64, whence: Whence) -> Result<u64, FsError> {
        match self.call(0, Request::Seek { handle, pos, whence }).await? {
            Response::Seek(pos) => Ok(pos),
            _ => unreachable!(),
        }
    }

    async fn read(&self, handle: u64, n: usize) -> Result<Vec<u8>, FsError> {
        match self.call(0, Request::Read { handle, n }).await? {
            Response::Read(data) => Ok(data),
            _ => unreachable!(),
        }
    }

    async fn write(&self, handle: u64, data: &[u8]) -> Result<usize, FsError> {
        let request = Request::Write {
            handle,
            data: data.to_vec(),
        };
        match self.call(0, request).await? {
            Response::Write(n) => Ok(n),
            _ => unreachable!(),
        }
    }

    async fn truncate(&self, handle: u64, len: u64) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Truncate { handle, len }).await)
    }

    async fn close(&self, handle: u64) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Close { handle }).await)
    }

    async fn unlink(&self, path: &UfsPath) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Unlink { path: path.clone() }).await)
    }

    async fn mkdir(&self, path: &UfsPath) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Mkdir { path: path.clone() }).await)
    }

    async fn rmdir(&self, path: &UfsPath) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Rmdir { path: path.clone() }).await)
    }

    async fn flush(&self, handle: u64) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Flush { handle }).await)
    }

    async fn start(&self) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Start).await)
    }

    async fn stop(&self) -> Result<(), FsError> {
        unit_reply!(self.call(0, Request::Stop).await)
    }

    fn scope(&self) -> AccessScope {
        self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[tokio::test]
    async fn put_then_cat_via_worker_thread() {
        let fs = SyncToAsync::spawn(MemoryUfs::new());
        let path = UfsPath::new("/a.txt");
        AsyncUfs::put(&fs, &path, b"through a thread").await.unwrap();
        assert_eq!(AsyncUfs::cat(&fs, &path).await.unwrap(), b"through a thread");
    }

    #[tokio::test]
    async fn scope_passes_through_from_inner() {
        let fs = SyncToAsync::spawn(MemoryUfs::new());
        assert_eq!(fs.scope(), AccessScope::Thread);
    }

    #[tokio::test]
    async fn concurrent_calls_all_complete() {
        let fs = Arc::new(SyncToAsync::spawn(MemoryUfs::new()));
        let mut tasks = Vec::new();
        for i in 0..16 {
            let fs = fs.clone();
            tasks.push(tokio::spawn(async move {
                let path = UfsPath::new(format!("/{i}.txt"));
                AsyncUfs::put(&*fs, &path, b"x").await.unwrap();
                AsyncUfs::cat(&*fs, &path).await.unwrap()
            }));
        }
        for t in tasks {
            assert_eq!(t.await.unwrap(), b"x");
        }
    }
}
