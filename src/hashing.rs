//! Streaming SHA-256 content fingerprinting.
//!
//! Files are read in fixed-size chunks so memory stays bounded regardless of
//! file size. The digest depends on content only, never on path or metadata.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Chunk size for streaming reads.
pub const HASH_CHUNK_SIZE: usize = 4096;

/// Compute the SHA-256 digest of a file's content as 64 lowercase hex chars.
///
/// Errors propagate if the file disappears or becomes unreadable mid-read.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();

    let mut buffer = [0u8; HASH_CHUNK_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 of an in-memory buffer, same encoding as [`hash_file`].
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_hash_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"test content");

        let hash1 = hash_file(&path).unwrap();
        let hash2 = hash_file(&path).unwrap();
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_known_value() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"malware");

        // sha256("malware")
        assert_eq!(
            hash_file(&path).unwrap(),
            "2f293f67aa33f2ce247b28d6fb2fef2623cfde731f96b3d7f84ae74e9e192bdd"
        );
    }

    #[test]
    fn test_hash_changes_with_one_byte() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.txt", b"content 1");
        let b = write_file(&dir, "b.txt", b"content 2");

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_hash_independent_of_path() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "one.bin", b"same bytes");
        let b = write_file(&dir, "two.bin", b"same bytes");

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_hash_spans_chunk_boundary() {
        let dir = TempDir::new().unwrap();
        let content = vec![0xabu8; HASH_CHUNK_SIZE * 3 + 17];
        let path = write_file(&dir, "big.bin", &content);

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(&content));
    }

    #[test]
    fn test_hash_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = hash_file(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    proptest! {
        #[test]
        fn prop_digest_shape(content in proptest::collection::vec(any::<u8>(), 0..8192)) {
            let digest = hash_bytes(&content);
            prop_assert_eq!(digest.len(), 64);
            prop_assert!(digest.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        }
    }
}
