//! One-shot recursive folder scan.
//!
//! Same fingerprint + lookup logic as the real-time pipeline, without the
//! concurrency: walk the tree, hash every regular file, report signature
//! matches. Re-running over an unchanged tree yields the identical result.

use crate::hashing;
use crate::logger::EventLog;
use crate::signatures::SignatureStore;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A signature match found during a folder scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Infection {
    pub path: PathBuf,
    pub signature_name: String,
    pub digest: String,
}

/// Result of a folder scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Files successfully hashed
    pub scanned: usize,
    /// Files whose hashing failed (vanished, unreadable)
    pub errors: usize,
    pub infected: Vec<Infection>,
}

/// Recursively scan `root`, logging alerts and a summary line to `log`.
///
/// Per-file I/O errors are logged and skipped; they never abort the scan.
pub fn scan_folder(root: &Path, store: &SignatureStore, log: &EventLog) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        let digest = match hashing::hash_file(path) {
            Ok(digest) => digest,
            Err(e) => {
                warn!("Error scanning {}: {}", path.display(), e);
                log.append(&format!("Error scanning {}: {}", path.display(), e));
                outcome.errors += 1;
                continue;
            }
        };
        outcome.scanned += 1;

        if let Some(record) = store.lookup(&digest) {
            log.append(&format!(
                "[ALERT] Infected file: {} [{}]",
                path.display(),
                record.name
            ));
            warn!(
                path = %path.display(),
                signature = %record.name,
                "Infected file detected"
            );
            outcome.infected.push(Infection {
                path: path.to_path_buf(),
                signature_name: record.name.clone(),
                digest,
            });
        } else {
            debug!("Clean: {}", path.display());
        }
    }

    log.append(&format!(
        "Scanned {} files, {} infected",
        outcome.scanned,
        outcome.infected.len()
    ));

    outcome
}
