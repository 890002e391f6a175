//! Bounded scan-task dispatch and per-path mutual exclusion.

use crate::detection::ScanTask;
use dashmap::DashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Submission handle over a bounded queue feeding the worker pool.
///
/// `submit` applies backpressure: when every worker is busy and the queue is
/// full it waits for a slot instead of dropping work. No ordering is
/// guaranteed across tasks, including tasks for the same path.
#[derive(Clone)]
pub struct TaskDispatcher {
    queue: mpsc::Sender<ScanTask>,
}

impl TaskDispatcher {
    /// Submit fire-and-forget work. Returns false if the pool has shut down.
    pub async fn submit(&self, task: ScanTask) -> bool {
        self.queue.send(task).await.is_ok()
    }
}

/// Worker tasks draining the dispatch queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Wait for all workers to finish. Workers exit once every dispatcher
    /// clone is dropped and the queue is drained, so this completes
    /// deterministically during shutdown.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// Spawn `workers` tasks consuming a queue of depth `queue_depth`, running
/// `handler` on each received task.
pub fn spawn_workers<F, Fut>(
    workers: usize,
    queue_depth: usize,
    handler: F,
) -> (TaskDispatcher, WorkerPool)
where
    F: Fn(ScanTask) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(queue_depth.max(1));
    let rx = Arc::new(tokio::sync::Mutex::new(rx));
    let handler = Arc::new(handler);

    let handles = (0..workers.max(1))
        .map(|id| {
            let rx = Arc::clone(&rx);
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                loop {
                    // Hold the receiver lock only while waiting for a task so
                    // other workers can pick up the next one concurrently.
                    let task = { rx.lock().await.recv().await };
                    match task {
                        Some(task) => handler(task).await,
                        None => break,
                    }
                }
                debug!("Scan worker {} stopped", id);
            })
        })
        .collect();

    (TaskDispatcher { queue: tx }, WorkerPool { handles })
}

/// Per-path single-flight coordination.
///
/// At most one in-flight fingerprint/lookup per path: workers acquire the
/// path's lock before the stability stage, so two admitted tasks for the same
/// path never hash concurrently.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: DashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, path: &Path) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop the map entry once nothing else holds the lock.
    pub fn release(&self, path: &Path) {
        self.locks
            .remove_if(path, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
