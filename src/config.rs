//! TOML-based configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_DB_FILE: &str = "signatures.json";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_MONITOR_LOG: &str = "realtime_log.txt";
const DEFAULT_SCAN_LOG: &str = "scan_log.txt";

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_QUEUE_DEPTH: usize = 64;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;
const DEFAULT_DEBOUNCE_TTL_SECS: u64 = 5;
const DEFAULT_DEBOUNCE_MAX_PATHS: usize = 10_000;
const DEFAULT_STABILITY_CHECKS: u32 = 3;
const DEFAULT_STABILITY_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// JSON signature database path
    #[serde(default = "default_db_file")]
    pub signatures_file: PathBuf,
    /// Directory for the append-only log sinks
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Log file name for the real-time monitor
    #[serde(default = "default_monitor_log")]
    pub log_file: String,
    /// Number of scan worker tasks
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Scan queue depth; submission blocks when full
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// Capacity of the watcher -> orchestrator event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
    /// Per-path debounce window in seconds
    #[serde(default = "default_debounce_ttl")]
    pub debounce_ttl_secs: u64,
    /// Maximum distinct paths tracked by the debouncer
    #[serde(default = "default_debounce_max_paths")]
    pub debounce_max_paths: usize,
    /// Number of size samples taken by the stability gate
    #[serde(default = "default_stability_checks")]
    pub stability_checks: u32,
    /// Pause between stability samples in milliseconds
    #[serde(default = "default_stability_interval")]
    pub stability_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Log file name for one-shot folder scans
    #[serde(default = "default_scan_log")]
    pub log_file: String,
}

fn default_db_file() -> PathBuf {
    PathBuf::from(DEFAULT_DB_FILE)
}
fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}
fn default_monitor_log() -> String {
    DEFAULT_MONITOR_LOG.to_string()
}
fn default_scan_log() -> String {
    DEFAULT_SCAN_LOG.to_string()
}
fn default_workers() -> usize {
    DEFAULT_WORKERS
}
fn default_queue_depth() -> usize {
    DEFAULT_QUEUE_DEPTH
}
fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}
fn default_debounce_ttl() -> u64 {
    DEFAULT_DEBOUNCE_TTL_SECS
}
fn default_debounce_max_paths() -> usize {
    DEFAULT_DEBOUNCE_MAX_PATHS
}
fn default_stability_checks() -> u32 {
    DEFAULT_STABILITY_CHECKS
}
fn default_stability_interval() -> u64 {
    DEFAULT_STABILITY_INTERVAL_MS
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            signatures_file: default_db_file(),
            log_dir: default_log_dir(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_file: default_monitor_log(),
            workers: DEFAULT_WORKERS,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            debounce_ttl_secs: DEFAULT_DEBOUNCE_TTL_SECS,
            debounce_max_paths: DEFAULT_DEBOUNCE_MAX_PATHS,
            stability_checks: DEFAULT_STABILITY_CHECKS,
            stability_interval_ms: DEFAULT_STABILITY_INTERVAL_MS,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            log_file: default_scan_log(),
        }
    }
}

impl Config {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn load_or_default(path: &std::path::Path) -> Self {
        Self::load(path).unwrap_or_default()
    }
}
