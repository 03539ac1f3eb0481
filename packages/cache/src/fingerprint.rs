// ABOUTME: Deterministic cache keys for generation inputs
// ABOUTME: SHA-256 over length-prefixed operation and parameter strings

use sha2::{Digest, Sha256};

/// Compute the cache key for a generation operation and its ordered inputs.
///
/// The key is `<operation>:<sha256 hex>`. Every part is length-prefixed before
/// hashing so that moving a separator between parameters (`["a:b", "c"]` vs
/// `["a", "b:c"]`) yields a different key.
pub fn fingerprint<S: AsRef<str>>(operation: &str, params: &[S]) -> String {
    let mut hasher = Sha256::new();
    hash_part(&mut hasher, operation);
    hasher.update((params.len() as u64).to_be_bytes());
    for param in params {
        hash_part(&mut hasher, param.as_ref());
    }
    format!("{}:{}", operation, hex::encode(hasher.finalize()))
}

fn hash_part(hasher: &mut Sha256, part: &str) {
    hasher.update((part.len() as u64).to_be_bytes());
    hasher.update(part.as_bytes());
}
