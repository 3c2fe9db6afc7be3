//! Cache key computation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
///
/// The key is the SHA-256 hex digest of the request method and the
/// origin-form URL (path plus query string), separated by a newline.
/// Two requests map to the same entry exactly when both method and URL
/// (including any query string) are identical.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
