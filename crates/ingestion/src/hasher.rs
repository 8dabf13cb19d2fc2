//! Content hashing for document identity

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of raw document bytes.
///
/// Documents are identified by content, not by file name: renaming a file
/// does not change its hash, while editing a single byte does.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
