//! Content-addressed document fingerprinting.
//!
//! A document's identity is the SHA-256 digest of its name followed by its
//! full extracted text. Two ingestions of the same `(name, content)` pair
//! always produce the same digest; this is the sole mechanism used to
//! decide whether a document has already been ingested.

use sha2::{Digest, Sha256};

/// Compute the dedup fingerprint for a document.
///
/// Hashes the UTF-8 bytes of `name` then `content` and returns the digest
/// as 64 lowercase hex characters. Pure function; no error conditions.
///
/// # Example
///
/// ```rust
/// use docsift_core::fingerprint::fingerprint;
///
/// let a = fingerprint("report.pdf", "hello");
/// assert_eq!(a, fingerprint("report.pdf", "hello"));
/// assert_eq!(a.len(), 64);
/// ```
pub fn fingerprint(name: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_identical_digest() {
        assert_eq!(fingerprint("doc.pdf", "body"), fingerprint("doc.pdf", "body"));
    }

    #[test]
    fn name_is_part_of_identity() {
        assert_ne!(fingerprint("a.pdf", "body"), fingerprint("b.pdf", "body"));
    }

    #[test]
    fn content_is_part_of_identity() {
        assert_ne!(fingerprint("a.pdf", "body"), fingerprint("a.pdf", "other"));
    }

    #[test]
    fn digest_is_hex_encoded() {
        let digest = fingerprint("doc", "text");
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
