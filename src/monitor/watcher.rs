//! File system watcher adapter.
//!
//! Bridges OS-level change notifications onto a bounded channel of
//! [`FileEvent`]s. Completeness, ordering, and batching of the raw
//! notifications are inherited from the underlying OS mechanism and not
//! strengthened here.

use crate::detection::{FileAction, FileEvent};
use anyhow::{Context, Result};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Recursive watch over a root directory, running until dropped or stopped.
pub struct FileWatcher {
    inner: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root` recursively, delivering mapped events to `tx`.
    ///
    /// An invalid or missing root fails here, before any event is delivered.
    /// The notify callback runs on the watcher's own thread and blocks when
    /// the channel is full, so a slow consumer backpressures the OS event
    /// stream instead of dropping events.
    pub fn start(root: &Path, tx: mpsc::Sender<FileEvent>) -> Result<Self> {
        let mut inner = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    for file_event in map_event(event) {
                        if tx.blocking_send(file_event).is_err() {
                            // Consumer gone; the watcher is shutting down.
                            return;
                        }
                    }
                }
                Err(e) => warn!("Watch error: {}", e),
            },
            notify::Config::default(),
        )
        .context("failed to create file system watcher")?;

        inner
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
        debug!("Watching {} recursively", root.display());

        Ok(Self {
            inner,
            root: root.to_path_buf(),
        })
    }

    /// Stop emitting events. Dropping the watcher has the same effect; this
    /// makes the confirmation explicit for shutdown sequencing.
    pub fn stop(mut self) {
        let _ = self.inner.unwatch(&self.root);
    }
}

/// Map a raw notification to pipeline events.
///
/// Explicit directory create/remove, access, and rename-from notifications
/// produce nothing. A rename delivers the destination path, mirroring how
/// the pipeline treats a move: new content appeared at the destination.
fn map_event(event: Event) -> Vec<FileEvent> {
    let action = match event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            return Vec::new()
        }
        EventKind::Create(_) => FileAction::Created,
        EventKind::Modify(ModifyKind::Name(rename)) => match rename {
            // The From half carries the old path; the destination arrives
            // separately (To) or as the last path of a Both event.
            RenameMode::From => return Vec::new(),
            _ => FileAction::Moved,
        },
        EventKind::Modify(_) => FileAction::Modified,
        EventKind::Remove(_) => FileAction::Deleted,
        _ => return Vec::new(),
    };

    if action == FileAction::Moved {
        // A Both rename lists [source, destination]; keep the destination.
        return event
            .paths
            .into_iter()
            .last()
            .map(|path| vec![FileEvent::new(path, action)])
            .unwrap_or_default();
    }

    event
        .paths
        .into_iter()
        .map(|path| FileEvent::new(path, action))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};

    fn raw(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_map_create() {
        let events = map_event(raw(EventKind::Create(CreateKind::File), &["/tmp/a"]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, FileAction::Created);
        assert_eq!(events[0].path, PathBuf::from("/tmp/a"));
    }

    #[test]
    fn test_map_modify_data() {
        let events = map_event(raw(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/tmp/a"],
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, FileAction::Modified);
    }

    #[test]
    fn test_map_remove() {
        let events = map_event(raw(EventKind::Remove(RemoveKind::File), &["/tmp/a"]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, FileAction::Deleted);
    }

    #[test]
    fn test_map_rename_both_keeps_destination() {
        let events = map_event(raw(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/tmp/old", "/tmp/new"],
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, FileAction::Moved);
        assert_eq!(events[0].path, PathBuf::from("/tmp/new"));
    }

    #[test]
    fn test_map_rename_from_dropped() {
        let events = map_event(raw(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/tmp/old"],
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn test_map_folder_create_dropped() {
        let events = map_event(raw(EventKind::Create(CreateKind::Folder), &["/tmp/newdir"]));
        assert!(events.is_empty());
    }

    #[test]
    fn test_map_access_dropped() {
        use notify::event::{AccessKind, AccessMode};
        let events = map_event(raw(
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            &["/tmp/a"],
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn test_start_fails_on_missing_root() {
        let (tx, _rx) = mpsc::channel(8);
        assert!(FileWatcher::start(Path::new("/nonexistent/sigwatch-root"), tx).is_err());
    }
}
