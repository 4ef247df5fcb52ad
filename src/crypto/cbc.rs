//! AES-128-CBC block operations with PKCS7 padding.
//!
//! Every symmetric key in the host protocol is 16 bytes, so the cipher
//! core is fixed to AES-128; other key lengths are rejected outright.
//! Callers never choose padding or mode, only key and IV.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::crypto::bytes::random_bytes;
use crate::error::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block size in bytes; also the required key and IV length.
pub const BLOCK_SIZE: usize = 16;

fn check_key_iv(key: &[u8], iv: &[u8]) -> Result<()> {
    if key.len() != BLOCK_SIZE {
        return Err(Error::InvalidArgument(format!(
            "AES key must be {} bytes, got {}",
            BLOCK_SIZE,
            key.len()
        )));
    }
    if iv.len() != BLOCK_SIZE {
        return Err(Error::InvalidArgument(format!(
            "IV must be {} bytes, got {}",
            BLOCK_SIZE,
            iv.len()
        )));
    }
    Ok(())
}

/// Encrypt `data` with AES-128-CBC and PKCS7 padding.
///
/// Output length is always a multiple of 16 and at least one block
/// longer than a block-aligned input (the padding block).
pub fn encrypt(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    check_key_iv(key, iv)?;
    let cipher = Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|e| Error::EncryptionFailed(format!("cipher init: {}", e)))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(data))
}

/// Encrypt `data` under a freshly generated random IV.
///
/// Returns `(iv, ciphertext)`; the IV travels with the ciphertext.
pub fn encrypt_with_random_iv(data: &[u8], key: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let iv = random_bytes(BLOCK_SIZE);
    let ciphertext = encrypt(data, key, &iv)?;
    Ok((iv, ciphertext))
}

/// Decrypt AES-128-CBC ciphertext and strip PKCS7 padding.
///
/// Padding validation failures surface as [`Error::DecryptionFailed`];
/// they usually mean a wrong key or corrupted ciphertext.
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    check_key_iv(key, iv)?;
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(Error::InvalidArgument(format!(
            "ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            BLOCK_SIZE
        )));
    }
    let cipher = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|e| Error::DecryptionFailed(format!("cipher init: {}", e)))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::DecryptionFailed("padding validation failed".to_string()))
}

/// Encrypt an empty input, producing exactly one full padding block.
///
/// Used by the streaming decryptor to synthesize the padding block an
/// interior chunk is missing. `E(key, pad16 XOR iv)` for the PKCS7
/// all-16s padding of a zero-length message.
pub(crate) fn encrypt_padding_block(key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let block = encrypt(&[], key, iv)?;
    debug_assert_eq!(block.len(), BLOCK_SIZE);
    Ok(block)
}

// ============================================================================
// TESTS
// ============================================================================
