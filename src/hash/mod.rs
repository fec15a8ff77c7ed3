//! Content hashing.
//!
//! A file's identity is the SHA-256 digest of its full byte stream. The same
//! function serves both the destination-index pass and candidate evaluation,
//! so equality comparisons always compare like with like.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Fixed-width identity of a file's content.
///
/// Two files with equal digests are treated as identical content regardless
/// of name, timestamp, or location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// First six hex characters, used to disambiguate filenames.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..3])
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Hash a file's entire byte stream.
///
/// The stream is read exactly once; a read failure surfaces as an error for
/// this file alone.
pub fn hash_file(path: &Path) -> Result<ContentDigest> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {} for hashing", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)
        .with_context(|| format!("failed to read {} while hashing", path.display()))?;
    Ok(ContentDigest(hasher.finalize().into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn identical_content_hashes_identically() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.bin");
        let b = temp_dir.path().join("b.bin");
        fs::write(&a, b"the same bytes").unwrap();
        fs::write(&b, b"the same bytes").unwrap();

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn different_content_hashes_differently() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.bin");
        let b = temp_dir.path().join("b.bin");
        fs::write(&a, b"one").unwrap();
        fs::write(&b, b"two").unwrap();

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn digest_formats_as_hex() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x");
        fs::write(&path, b"hello").unwrap();

        let digest = hash_file(&path).unwrap();
        let full = digest.to_string();
        assert_eq!(full.len(), 64);
        assert!(full.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest.short(), full[..6]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(hash_file(&temp_dir.path().join("nope")).is_err());
    }
}
