use sha2::{Digest, Sha256};

/// Size in bytes of the strong hash.
pub const STRONG_HASH_SIZE: usize = 32;

/// SHA-256 digest of a block, used to confirm weak checksum matches.
pub type StrongHash = [u8; STRONG_HASH_SIZE];

/// Compute the strong hash of `block`.
#[inline]
pub fn strong_hash(block: &[u8]) -> StrongHash {
    let mut hash = [0; STRONG_HASH_SIZE];
    hash.copy_from_slice(&Sha256::digest(block));
    hash
}
