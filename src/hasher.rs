//! Content hashing for duplicate detection.
//!
//! Files are streamed through a fixed-size buffer into BLAKE3, so memory use
//! stays flat regardless of file size.

use crate::file_organizer::{OrganizeError, OrganizeResult};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024;

/// A 256-bit BLAKE3 digest of a file's content.
///
/// Two files with equal digests are treated as content-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest(blake3::Hash);

impl ContentDigest {
    /// Lowercase hex representation of the digest.
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Computes the content digest of the file at `path`.
pub fn digest(path: &Path) -> OrganizeResult<ContentDigest> {
    let hash_error = |e: std::io::Error| OrganizeError::HashFailure {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::open(path).map_err(hash_error)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(hash_error)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentDigest(hasher.finalize()))
}
