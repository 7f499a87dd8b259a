//! Content digests for stored blobs.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of a blob body, served as its entity tag.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_stability() {
        assert_eq!(content_digest(b"icon"), content_digest(b"icon"));
    }

    #[test]
    fn test_digest_differs_by_content() {
        assert_ne!(content_digest(b"icon-a"), content_digest(b"icon-b"));
    }

    #[test]
    fn test_digest_format() {
        let digest = content_digest(b"");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }
}
