//! Signature database: digest -> record lookup table.
//!
//! The backing store is a JSON object whose keys are 64-character lowercase
//! hexadecimal SHA-256 digests and whose values carry the malware family
//! name. A store is loaded once at startup and never mutates afterwards, so
//! lookups are safe to share across tasks without locking. Signatures added
//! to the backing file mid-session are not observed.

use crate::hashing;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Metadata stored per signature digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignatureRecord {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("failed to read signature database {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed signature database {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid digest key {digest:?} in signature database {path}")]
    InvalidDigest { digest: String, path: PathBuf },
}

/// Returns true for a 64-character lowercase hex SHA-256 digest.
pub fn is_valid_digest(s: &str) -> bool {
    s.len() == 64
        && s.bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Immutable digest -> record lookup table.
#[derive(Debug, Default)]
pub struct SignatureStore {
    records: HashMap<String, SignatureRecord>,
}

impl SignatureStore {
    /// Load a store from a JSON database file.
    ///
    /// A missing file yields an empty store; malformed content or an invalid
    /// digest key is an error, so a session never starts with a partially
    /// loaded store.
    pub fn load(path: &Path) -> Result<Self, SignatureError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Signature database {} not found, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SignatureError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let records: HashMap<String, SignatureRecord> =
            serde_json::from_str(&content).map_err(|e| SignatureError::Malformed {
                path: path.to_path_buf(),
                source: e,
            })?;

        for digest in records.keys() {
            if !is_valid_digest(digest) {
                return Err(SignatureError::InvalidDigest {
                    digest: digest.clone(),
                    path: path.to_path_buf(),
                });
            }
        }

        Ok(Self { records })
    }

    /// Build a store from already-validated records.
    pub fn from_records(records: HashMap<String, SignatureRecord>) -> Self {
        Self { records }
    }

    /// Exact-match lookup by content digest.
    pub fn lookup(&self, digest: &str) -> Option<&SignatureRecord> {
        self.records.get(digest)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Hash a file and record it in the signature database under `name`.
///
/// Creates the database if missing; an existing entry for the same digest is
/// overwritten. Returns the digest that was added.
pub fn add_signature(db_path: &Path, file: &Path, name: &str) -> anyhow::Result<String> {
    let mut records: HashMap<String, SignatureRecord> = match fs::read_to_string(db_path) {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("malformed signature database {}", db_path.display()))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read {}", db_path.display()))
        }
    };

    let digest = hashing::hash_file(file)
        .with_context(|| format!("failed to hash {}", file.display()))?;

    records.insert(
        digest.clone(),
        SignatureRecord {
            name: name.to_string(),
        },
    );

    let content = serde_json::to_string_pretty(&records)?;
    fs::write(db_path, content)
        .with_context(|| format!("failed to write {}", db_path.display()))?;

    Ok(digest)
}
