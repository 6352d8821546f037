//! SHA-256 content digests.

use linkpack_common::types::Digest;
use sha2::{Digest as _, Sha256};

/// Computes the SHA-256 digest of `content`.
#[must_use]
pub fn digest_bytes(content: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(content);
    Digest::from_sha256(hasher.finalize().into())
}
