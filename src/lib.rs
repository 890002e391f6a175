//! sigwatch - signature-based malware detection
//!
//! Detects known-malicious files by exact SHA-256 content fingerprint, either
//! in real time as files appear or change inside a watched directory tree, or
//! through a one-shot recursive folder scan.
//!
//! This library provides the detection pipeline; the binary in main.rs wires
//! it to a CLI.

pub mod config;
pub mod detection;
pub mod hashing;
pub mod logger;
pub mod monitor;
pub mod scanner;
pub mod signatures;

pub use config::Config;
pub use detection::{Alert, FileAction, FileEvent, ScanTask};
pub use signatures::{SignatureRecord, SignatureStore};
