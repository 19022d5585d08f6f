use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of a byte stream, rendered as lowercase hex
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
