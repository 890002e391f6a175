//! Append-only log sink.
//!
//! One line per event, `[YYYY-MM-DD HH:MM:SS] <message>`. Appends are
//! serialized under a lock so concurrent writers never interleave or
//! truncate lines. This sink is the contractual event/alert record; runtime
//! diagnostics go through `tracing` instead.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

pub struct EventLog {
    file: Mutex<File>,
    path: PathBuf,
}

impl EventLog {
    /// Open (creating if needed) `dir/name` for appending.
    pub fn open(dir: &Path, name: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Path of the backing file, used to filter self-generated watch events.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line. Sink failures are reported through
    /// tracing and never propagate into the pipeline.
    pub fn append(&self, message: &str) {
        let line = format_line(message);
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = file.write_all(line.as_bytes()) {
            warn!("Failed to append to {}: {}", self.path.display(), e);
        }
    }
}

fn format_line(message: &str) -> String {
    format!("[{}] {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_line_format() {
        let line = format_line("created /tmp/x");
        // [YYYY-MM-DD HH:MM:SS] <message>\n
        assert_eq!(line.as_bytes()[0], b'[');
        assert_eq!(&line[20..22], "] ");
        assert!(line.ends_with("created /tmp/x\n"));
        assert_eq!(line[1..20].chars().filter(|c| *c == ':').count(), 2);
        assert_eq!(line[1..20].chars().filter(|c| *c == '-').count(), 2);
    }

    #[test]
    fn test_append_creates_dir_and_file() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::open(&dir.path().join("logs"), "events.txt").unwrap();
        log.append("monitor started");

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.ends_with("monitor started\n"));
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_concurrent_appends_never_interleave() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(EventLog::open(dir.path(), "events.txt").unwrap());

        let mut handles = Vec::new();
        for i in 0..8 {
            let log = Arc::clone(&log);
            handles.push(std::thread::spawn(move || {
                for j in 0..50 {
                    log.append(&format!("writer-{} line-{}", i, j));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 8 * 50);
        for line in lines {
            assert!(line.starts_with('['));
            assert!(line.contains("] writer-"));
        }
    }
}
