//! Per-path event debouncing with TTL.
//!
//! Suppresses redundant scan scheduling for the same path within a time
//! window. This throttles scheduling only: two admitted tasks for the same
//! path can still overlap if they arrive more than a TTL apart while an
//! earlier task is in flight (the per-path lock in the dispatcher handles
//! that case).

use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default admit window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Per-path last-admitted timestamps behind a single lock.
///
/// The admit check and the timestamp update are atomic relative to other
/// admitters of the same path. An LRU cache bounds memory under churny
/// directory trees.
pub struct EventDebouncer {
    entries: Mutex<LruCache<PathBuf, Instant>>,
    ttl: Duration,
}

impl EventDebouncer {
    pub fn new(ttl: Duration, max_paths: usize) -> Self {
        let capacity = NonZeroUsize::new(max_paths).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Admit or drop an event for `path` observed at `now`.
    ///
    /// Returns true (and records `now`) if the path has no prior admission or
    /// the last one is at least a TTL old; otherwise returns false and leaves
    /// the recorded timestamp untouched. Dropped events are not coalesced or
    /// retried.
    pub fn admit(&self, path: &Path, now: Instant) -> bool {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        let key = path.to_path_buf();
        if let Some(last) = entries.get(&key) {
            if now.saturating_duration_since(*last) < self.ttl {
                return false;
            }
        }
        entries.put(key, now);
        true
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, 10_000)
    }
}

impl std::fmt::Debug for EventDebouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDebouncer")
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_first_event_admitted() {
        let debouncer = EventDebouncer::default();
        assert!(debouncer.admit(Path::new("/tmp/a"), Instant::now()));
    }

    #[test]
    fn test_within_ttl_dropped() {
        let debouncer = EventDebouncer::default();
        let t0 = Instant::now();

        assert!(debouncer.admit(Path::new("/tmp/a"), t0));
        assert!(!debouncer.admit(Path::new("/tmp/a"), t0 + Duration::from_secs(1)));
        assert!(!debouncer.admit(Path::new("/tmp/a"), t0 + Duration::from_millis(4999)));
    }

    #[test]
    fn test_at_ttl_admitted_again() {
        let debouncer = EventDebouncer::default();
        let t0 = Instant::now();

        assert!(debouncer.admit(Path::new("/tmp/a"), t0));
        assert!(debouncer.admit(Path::new("/tmp/a"), t0 + Duration::from_secs(5)));
    }

    #[test]
    fn test_paths_independent() {
        let debouncer = EventDebouncer::default();
        let t0 = Instant::now();

        assert!(debouncer.admit(Path::new("/tmp/a"), t0));
        assert!(debouncer.admit(Path::new("/tmp/b"), t0));
        assert!(!debouncer.admit(Path::new("/tmp/a"), t0 + Duration::from_secs(1)));
        assert!(!debouncer.admit(Path::new("/tmp/b"), t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_drop_does_not_extend_window() {
        let debouncer = EventDebouncer::default();
        let t0 = Instant::now();

        assert!(debouncer.admit(Path::new("/tmp/a"), t0));
        // A dropped event at t0+4s must not push the window out to t0+9s.
        assert!(!debouncer.admit(Path::new("/tmp/a"), t0 + Duration::from_secs(4)));
        assert!(debouncer.admit(Path::new("/tmp/a"), t0 + Duration::from_secs(5)));
    }

    #[test]
    fn test_lru_bound() {
        let debouncer = EventDebouncer::new(DEFAULT_TTL, 2);
        let t0 = Instant::now();

        assert!(debouncer.admit(Path::new("/tmp/a"), t0));
        assert!(debouncer.admit(Path::new("/tmp/b"), t0));
        assert!(debouncer.admit(Path::new("/tmp/c"), t0));
        assert_eq!(debouncer.len(), 2);

        // /tmp/a was evicted, so it is admitted again even inside the TTL.
        assert!(debouncer.admit(Path::new("/tmp/a"), t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_concurrent_admit_single_winner() {
        let debouncer = Arc::new(EventDebouncer::default());
        let t0 = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let debouncer = Arc::clone(&debouncer);
            handles.push(std::thread::spawn(move || {
                debouncer.admit(Path::new("/tmp/contended"), t0)
            }));
        }

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, 1);
    }

    proptest! {
        // For any pair of offsets, the second admit for a path succeeds iff
        // the gap since the last admitted event reaches the TTL.
        #[test]
        fn prop_admit_pair(delta_ms in 0u64..20_000) {
            let debouncer = EventDebouncer::default();
            let t0 = Instant::now();

            prop_assert!(debouncer.admit(Path::new("/p"), t0));
            let second = debouncer.admit(Path::new("/p"), t0 + Duration::from_millis(delta_ms));
            prop_assert_eq!(second, delta_ms >= 5000);
        }
    }
}
