//! Real-time monitoring pipeline.
//!
//! Wires the watcher, debouncer, dispatcher, stability gate, fingerprinter,
//! and signature store into the end-to-end pipeline and owns its lifecycle:
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`.

pub mod debounce;
pub mod dispatch;
pub mod stability;
pub mod watcher;

pub use debounce::EventDebouncer;
pub use dispatch::{PathLocks, TaskDispatcher, WorkerPool};
pub use stability::StabilityGate;
pub use watcher::FileWatcher;

use crate::config::Config;
use crate::detection::{Alert, FileAction, FileEvent, ScanTask};
use crate::hashing;
use crate::logger::EventLog;
use crate::signatures::SignatureStore;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of a monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Shared state for scan workers: everything a task needs after admission.
struct ScanContext {
    store: Arc<SignatureStore>,
    log: Arc<EventLog>,
    gate: StabilityGate,
    locks: PathLocks,
    alert_tx: mpsc::Sender<Alert>,
}

impl ScanContext {
    /// Run one scan task: single-flight guard, stability gate, fingerprint,
    /// signature lookup. Per-file errors are logged and abandon only this
    /// task; the session and sibling tasks are unaffected.
    async fn process(&self, task: ScanTask) {
        let guard = self.locks.acquire(&task.path).await;
        self.scan_path(&task).await;
        drop(guard);
        self.locks.release(&task.path);
    }

    async fn scan_path(&self, task: &ScanTask) {
        // Content may already be gone by the time a worker picks this up.
        if !task.path.is_file() {
            debug!("Skipping {}: no longer a regular file", task.path.display());
            return;
        }

        if !self.gate.is_stable(&task.path).await {
            debug!("Skipping {}: size read failed during polling", task.path.display());
            return;
        }

        let path = task.path.clone();
        let digest = match tokio::task::spawn_blocking(move || hashing::hash_file(&path)).await {
            Ok(Ok(digest)) => digest,
            Ok(Err(e)) => {
                warn!("Error checking {}: {}", task.path.display(), e);
                self.log
                    .append(&format!("Error checking {}: {}", task.path.display(), e));
                return;
            }
            Err(e) => {
                error!("Hash task for {} failed: {}", task.path.display(), e);
                return;
            }
        };

        match self.store.lookup(&digest) {
            Some(record) => {
                let alert =
                    Alert::new(task.path.clone(), task.action, digest, record.name.as_str());
                warn!(
                    path = %alert.path.display(),
                    signature = %alert.signature_name,
                    digest = %alert.digest,
                    "Infected file detected"
                );
                self.log.append(&alert.log_line());
                let _ = self.alert_tx.send(alert).await;
            }
            None => {
                debug!("Clean: {} ({})", task.path.display(), digest);
            }
        }
    }
}

/// A started monitoring session.
///
/// Obtained from [`Monitor::start`]; call [`shutdown`](Self::shutdown) to
/// stop the watcher, drain in-flight tasks, and reach `Stopped`
/// deterministically.
pub struct Monitor {
    watcher: Option<FileWatcher>,
    event_loop: JoinHandle<()>,
    pool: WorkerPool,
    log: Arc<EventLog>,
    state_tx: watch::Sender<MonitorState>,
    state_rx: watch::Receiver<MonitorState>,
}

impl Monitor {
    /// Load the signature store, open the log sink, start the watcher, and
    /// spawn the event loop and worker pool.
    ///
    /// Fatal before `Running`: a malformed signature database or an invalid
    /// watch root. A missing database is tolerated (empty store).
    pub fn start(root: &Path, config: &Config, alert_tx: mpsc::Sender<Alert>) -> Result<Self> {
        let (state_tx, state_rx) = watch::channel(MonitorState::Starting);

        let store = Arc::new(
            SignatureStore::load(&config.general.signatures_file)
                .context("failed to load signature database")?,
        );
        info!("Loaded {} signatures", store.len());

        let log = Arc::new(
            EventLog::open(&config.general.log_dir, &config.monitor.log_file)
                .context("failed to open monitor log")?,
        );

        let context = Arc::new(ScanContext {
            store,
            log: Arc::clone(&log),
            gate: StabilityGate::new(
                config.monitor.stability_checks,
                Duration::from_millis(config.monitor.stability_interval_ms),
            ),
            locks: PathLocks::new(),
            alert_tx,
        });

        let (dispatcher, pool) = dispatch::spawn_workers(
            config.monitor.workers,
            config.monitor.queue_depth,
            move |task| {
                let context = Arc::clone(&context);
                async move { context.process(task).await }
            },
        );

        let debouncer = EventDebouncer::new(
            Duration::from_secs(config.monitor.debounce_ttl_secs),
            config.monitor.debounce_max_paths,
        );

        let (event_tx, event_rx) = mpsc::channel(config.monitor.event_channel_capacity.max(1));
        let watcher = FileWatcher::start(root, event_tx)?;

        let display_root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        log.append(&format!("monitor started on {}", display_root.display()));
        info!("Monitoring {}", display_root.display());

        let event_loop = tokio::spawn(run_event_loop(
            event_rx,
            dispatcher,
            debouncer,
            Arc::clone(&log),
            config.general.log_dir.clone(),
        ));

        let _ = state_tx.send(MonitorState::Running);

        Ok(Self {
            watcher: Some(watcher),
            event_loop,
            pool,
            log,
            state_tx,
            state_rx,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        *self.state_rx.borrow()
    }

    /// Watch lifecycle transitions; remains valid after shutdown.
    pub fn state_watch(&self) -> watch::Receiver<MonitorState> {
        self.state_rx.clone()
    }

    /// Stop the watcher, drain in-flight scan tasks, and reach `Stopped`.
    ///
    /// Stopping the watcher closes the event channel, which ends the event
    /// loop; that drops the dispatcher, which closes the scan queue; workers
    /// finish whatever is queued and exit. No step waits on anything
    /// unbounded, so shutdown completes deterministically.
    pub async fn shutdown(mut self) {
        let _ = self.state_tx.send(MonitorState::Stopping);
        info!("Stopping monitor...");

        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
        if let Err(e) = self.event_loop.await {
            error!("Event loop task failed: {}", e);
        }
        self.pool.join().await;

        self.log.append("monitor stopped");
        let _ = self.state_tx.send(MonitorState::Stopped);
        info!("Monitor stopped");
    }
}

/// Consume watcher events until the channel closes.
async fn run_event_loop(
    mut event_rx: mpsc::Receiver<FileEvent>,
    dispatcher: TaskDispatcher,
    debouncer: EventDebouncer,
    log: Arc<EventLog>,
    log_dir: PathBuf,
) {
    while let Some(event) = event_rx.recv().await {
        handle_event(event, &dispatcher, &debouncer, &log, &log_dir).await;
    }
    debug!("Event loop stopped");
}

async fn handle_event(
    event: FileEvent,
    dispatcher: &TaskDispatcher,
    debouncer: &EventDebouncer,
    log: &EventLog,
    log_dir: &Path,
) {
    // The sink's own file must never re-enter the pipeline.
    if is_log_event(&event.path, log.path(), log_dir) {
        return;
    }

    log.append(&format!("{} {}", event.action, event.path.display()));
    debug!("{} {}", event.action, event.path.display());

    // Content is gone; log only, never schedule a scan.
    if event.action == FileAction::Deleted {
        return;
    }

    if !debouncer.admit(&event.path, Instant::now()) {
        debug!("Debounced {}", event.path.display());
        return;
    }

    if !dispatcher.submit(ScanTask::new(event.path, event.action)).await {
        warn!("Scan queue closed; dropping event");
    }
}

/// True for events generated by the log sink itself.
fn is_log_event(path: &Path, log_path: &Path, log_dir: &Path) -> bool {
    path.starts_with(log_dir)
        || (path.file_name().is_some() && path.file_name() == log_path.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_log_event() {
        let log_path = Path::new("logs/realtime_log.txt");
        let log_dir = Path::new("logs");

        assert!(is_log_event(
            Path::new("logs/realtime_log.txt"),
            log_path,
            log_dir
        ));
        assert!(is_log_event(
            Path::new("/watched/realtime_log.txt"),
            log_path,
            log_dir
        ));
        assert!(!is_log_event(Path::new("/watched/evil.bin"), log_path, log_dir));
        assert!(!is_log_event(Path::new("/watched/notes.txt"), log_path, log_dir));
    }
}
