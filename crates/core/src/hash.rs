//! Content hashing for stable ids and exact deduplication.

use sha2::{Digest, Sha256};

/// Full hex-encoded SHA-256 of the text.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// First 8 hex chars of [`content_hash`]. Used as an id suffix.
pub fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_is_prefix_of_full_hash() {
        let text = "We decided to use JWT tokens for authentication.";
        let full = content_hash(text);
        let short = short_hash(text);
        assert_eq!(full.len(), 64);
        assert_eq!(short.len(), 8);
        assert!(full.starts_with(&short));
    }

    #[test]
    fn hashing_is_stable() {
        assert_eq!(short_hash("abc"), short_hash("abc"));
        assert_ne!(short_hash("abc"), short_hash("abd"));
        assert_eq!(&content_hash("abc")[..8], "ba7816bf");
    }
}
