//! # Envelope Encryption
//!
//! Per-payload content keys wrapped under a master key.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ENVELOPE STRUCTURE                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  KeyHeader                        EncryptedKeyHeader                    │
//! │  ┌──────────────────┐             ┌────────────────────────────┐       │
//! │  │ iv       16 bytes│   wrap      │ iv                16 bytes │       │
//! │  │ aes_key  16 bytes│ ─────────►  │ encrypted_aes_key 48 bytes │       │
//! │  └──────────────────┘  under the  │ encryption_version    i32  │       │
//! │        │               master key └────────────────────────────┘       │
//! │        │ ciphers the                     │                             │
//! │        ▼ payload                         ▼ serialized form             │
//! │   content bytes               base64( iv ‖ key blob ‖ version BE )     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The 32-byte plaintext header (iv ‖ key) pads to exactly 48 bytes of
//! ciphertext, which keeps the serialized layout fixed-width.

use serde::{Deserialize, Serialize};

use crate::crypto::bytes::{bytes_to_int32, combine2, combine3, int32_to_bytes, split2, split3};
use crate::crypto::cbc::{self, BLOCK_SIZE};
use crate::crypto::ecc::{base64_decode, base64_encode, serde_base64};
use crate::crypto::sensitive::SensitiveBytes;
use crate::error::{Error, Result};

/// The only envelope version this client reads or writes.
pub const ENCRYPTION_VERSION: i32 = 1;

/// Ciphertext width of the wrapped 32-byte header.
const WRAPPED_KEY_LEN: usize = 48;

/// An unwrapped content key with its default IV.
///
/// Not serializable; the wire form is always [`EncryptedKeyHeader`].
pub struct KeyHeader {
    /// Default IV for the payload
    pub iv: [u8; BLOCK_SIZE],
    /// AES-128 content key
    pub aes_key: SensitiveBytes,
}

impl KeyHeader {
    /// Generate a fresh random content key and IV.
    pub fn new_random() -> Self {
        let iv_bytes = crate::crypto::bytes::random_bytes(BLOCK_SIZE);
        let mut iv = [0u8; BLOCK_SIZE];
        iv.copy_from_slice(&iv_bytes);
        Self {
            iv,
            aes_key: SensitiveBytes::random(BLOCK_SIZE),
        }
    }

    /// The all-zero sentinel header for unencrypted content slots.
    pub fn empty() -> Self {
        Self {
            iv: [0u8; BLOCK_SIZE],
            aes_key: SensitiveBytes::new(vec![0u8; BLOCK_SIZE]),
        }
    }

    /// Concatenate into the 32-byte wrap plaintext (iv then key).
    pub fn combine(&self) -> Vec<u8> {
        combine2(&self.iv, self.aes_key.as_bytes())
    }

    /// Rebuild from the 32-byte wrap plaintext.
    pub fn from_combined_bytes(bytes: &[u8]) -> Result<Self> {
        let (iv_part, key_part) = split2(bytes, BLOCK_SIZE, BLOCK_SIZE)?;
        let mut iv = [0u8; BLOCK_SIZE];
        iv.copy_from_slice(&iv_part);
        Ok(Self {
            iv,
            aes_key: SensitiveBytes::new(key_part),
        })
    }

    /// Encrypt a payload under the content key with the header's IV.
    pub fn encrypt_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        cbc::encrypt(data, self.aes_key.as_bytes(), &self.iv)
    }

    /// Encrypt a payload under the content key with an explicit IV.
    ///
    /// Used when several payload parts share one content key but must
    /// not share an IV.
    pub fn encrypt_payload(&self, payload_iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        cbc::encrypt(data, self.aes_key.as_bytes(), payload_iv)
    }

    /// Decrypt a payload ciphered with the header's own IV.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        cbc::decrypt(ciphertext, self.aes_key.as_bytes(), &self.iv)
    }

    /// Decrypt a payload ciphered with an explicit per-payload IV.
    pub fn decrypt_payload(&self, payload_iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        cbc::decrypt(ciphertext, self.aes_key.as_bytes(), payload_iv)
    }

    /// Overwrite the content key with zeros.
    pub fn wipe(&mut self) {
        self.aes_key.wipe();
    }
}

/// A content key wrapped under a master key, as stored and transmitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptedKeyHeader {
    /// Envelope format version; only [`ENCRYPTION_VERSION`] is valid
    pub encryption_version: i32,
    /// Outer IV the header was wrapped under
    #[serde(with = "serde_base64")]
    pub iv: Vec<u8>,
    /// The wrapped 32-byte header, always 48 bytes of ciphertext
    #[serde(with = "serde_base64")]
    pub encrypted_aes_key: Vec<u8>,
}

impl EncryptedKeyHeader {
    /// Wrap a [`KeyHeader`] under `wrapping_key` with the given outer IV.
    pub fn encrypt_key_header(
        header: &KeyHeader,
        outer_iv: &[u8],
        wrapping_key: &[u8],
    ) -> Result<Self> {
        let encrypted_aes_key = cbc::encrypt(&header.combine(), wrapping_key, outer_iv)?;
        debug_assert_eq!(encrypted_aes_key.len(), WRAPPED_KEY_LEN);
        Ok(Self {
            encryption_version: ENCRYPTION_VERSION,
            iv: outer_iv.to_vec(),
            encrypted_aes_key,
        })
    }

    /// The all-zero sentinel written for unencrypted content slots.
    pub fn empty() -> Self {
        Self {
            encryption_version: ENCRYPTION_VERSION,
            iv: vec![0u8; BLOCK_SIZE],
            encrypted_aes_key: vec![0u8; WRAPPED_KEY_LEN],
        }
    }

    /// Unwrap back into a [`KeyHeader`].
    ///
    /// The version is checked before any cryptography runs.
    pub fn decrypt_to_key_header(&self, wrapping_key: &[u8]) -> Result<KeyHeader> {
        if self.encryption_version != ENCRYPTION_VERSION {
            return Err(Error::UnsupportedVersion(self.encryption_version));
        }
        let combined = cbc::decrypt(&self.encrypted_aes_key, wrapping_key, &self.iv)?;
        KeyHeader::from_combined_bytes(&combined)
    }

    /// Serialize as base64 over `iv ‖ encrypted key ‖ version` with the
    /// version as a 4-byte big-endian integer.
    pub fn to_base64(&self) -> String {
        let packed = combine3(
            &self.iv,
            &self.encrypted_aes_key,
            &int32_to_bytes(self.encryption_version),
        );
        base64_encode(&packed)
    }

    /// Parse the base64 layout produced by [`to_base64`](Self::to_base64).
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let packed = base64_decode(encoded)?;
        let (iv, encrypted_aes_key, version_bytes) =
            split3(&packed, BLOCK_SIZE, WRAPPED_KEY_LEN, 4)?;
        Ok(Self {
            encryption_version: bytes_to_int32(&version_bytes)?,
            iv,
            encrypted_aes_key,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
