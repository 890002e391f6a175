//! Common types for file events and alerts.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// What happened to a file, as reported by the watcher.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Created,
    Modified,
    Moved,
    Deleted,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Moved => "moved",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for FileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw file system event delivered by the watcher.
///
/// Produced once per notification and consumed exactly once by the monitor
/// event loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEvent {
    pub path: PathBuf,
    pub action: FileAction,
    pub timestamp: DateTime<Local>,
}

impl FileEvent {
    pub fn new(path: PathBuf, action: FileAction) -> Self {
        Self {
            path,
            action,
            timestamp: Local::now(),
        }
    }
}

/// An independent unit of scan work submitted to the dispatcher.
///
/// No ordering relation to other tasks is guaranteed, including tasks for the
/// same path.
#[derive(Debug, Clone)]
pub struct ScanTask {
    pub path: PathBuf,
    pub action: FileAction,
    pub enqueued_at: Instant,
}

impl ScanTask {
    pub fn new(path: PathBuf, action: FileAction) -> Self {
        Self {
            path,
            action,
            enqueued_at: Instant::now(),
        }
    }
}

/// A signature match on a scanned file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub path: PathBuf,
    pub action: FileAction,
    pub digest: String,
    pub signature_name: String,
    pub timestamp: DateTime<Local>,
}

impl Alert {
    pub fn new(
        path: PathBuf,
        action: FileAction,
        digest: impl Into<String>,
        signature_name: impl Into<String>,
    ) -> Self {
        Self {
            path,
            action,
            digest: digest.into(),
            signature_name: signature_name.into(),
            timestamp: Local::now(),
        }
    }

    /// Message body written to the log sink for this alert.
    pub fn log_line(&self) -> String {
        format!(
            "[ALERT] {} infected file: {} [{}] {}",
            self.action.as_str().to_uppercase(),
            self.path.display(),
            self.signature_name,
            self.digest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_as_str() {
        assert_eq!(FileAction::Created.as_str(), "created");
        assert_eq!(FileAction::Modified.as_str(), "modified");
        assert_eq!(FileAction::Moved.as_str(), "moved");
        assert_eq!(FileAction::Deleted.as_str(), "deleted");
    }

    #[test]
    fn test_alert_log_line() {
        let alert = Alert::new(
            PathBuf::from("/tmp/evil.bin"),
            FileAction::Created,
            "a".repeat(64),
            "Test.Trojan",
        );

        assert_eq!(
            alert.log_line(),
            format!(
                "[ALERT] CREATED infected file: /tmp/evil.bin [Test.Trojan] {}",
                "a".repeat(64)
            )
        );
    }
}
