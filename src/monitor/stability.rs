//! Write-completion detection by size polling.

use std::io;
use std::path::Path;
use std::time::Duration;

/// Decides whether a file has finished being written.
///
/// The gate samples the file size, then `checks` times sleeps for `interval`
/// and samples again, adopting any changed size as the new baseline. The loop
/// always runs to completion and reports stable; only a failed size read
/// (file vanished, permission lost) reports unstable, immediately. The full
/// polling duration is spent on the calling worker task, never on the event
/// loop.
#[derive(Debug, Clone, Copy)]
pub struct StabilityGate {
    checks: u32,
    interval: Duration,
}

impl StabilityGate {
    pub fn new(checks: u32, interval: Duration) -> Self {
        Self { checks, interval }
    }

    pub async fn is_stable(&self, path: &Path) -> bool {
        let mut last = match file_size(path) {
            Ok(size) => size,
            Err(_) => return false,
        };

        for _ in 0..self.checks {
            tokio::time::sleep(self.interval).await;
            match file_size(path) {
                Ok(current) => {
                    if current != last {
                        last = current;
                    }
                }
                Err(_) => return false,
            }
        }

        true
    }
}

impl Default for StabilityGate {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

fn file_size(path: &Path) -> io::Result<u64> {
    std::fs::metadata(path).map(|m| m.len())
}
