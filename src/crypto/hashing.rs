//! Digest and key-derivation primitives.
//!
//! Three operations back the rest of the crate:
//! - plain SHA-256 (secret digests posted during login)
//! - a 16-byte XOR-folded SHA-256 used as the wrong-passphrase check
//!   on wrapped private keys
//! - HKDF-SHA256 for stretching raw ECDH output into the session secret

use hkdf::Hkdf;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Reduce `data` to 16 bytes: SHA-256, then XOR the two halves together.
///
/// This is the host protocol's key-hash function. It is stored alongside
/// wrapped private keys and compared before any unwrap attempt, so the
/// exact folding must match the host byte for byte.
pub fn reduce_sha256(data: &[u8]) -> [u8; 16] {
    let digest = sha256(data);
    let mut reduced = [0u8; 16];
    for i in 0..16 {
        reduced[i] = digest[i] ^ digest[i + 16];
    }
    reduced
}

/// HKDF-SHA256 with an explicit salt and no info context.
///
/// The salt is required and must carry at least 16 bytes; the host
/// refuses short salts during key agreement and so do we.
pub fn hkdf_sha256(ikm: &[u8], salt: &[u8], out_len: usize) -> Result<Vec<u8>> {
    if salt.len() < 16 {
        return Err(Error::InvalidArgument(format!(
            "salt must be at least 16 bytes, got {}",
            salt.len()
        )));
    }
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; out_len];
    hk.expand(&[], &mut okm)
        .map_err(|_| Error::KeyDerivationFailed(format!("invalid HKDF output length {}", out_len)))?;
    Ok(okm)
}

// ============================================================================
// TESTS
// ============================================================================
