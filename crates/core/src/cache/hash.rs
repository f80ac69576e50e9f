//! Store key generation.

use sha2::{Digest, Sha256};

/// Compute the store key for a canonical request target.
pub fn compute_request_key(target: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(target.as_bytes());
    hex::encode(hasher.finalize())
}
