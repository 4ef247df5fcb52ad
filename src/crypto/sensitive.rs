//! # Sensitive Byte Buffers
//!
//! Owned containers for secret material (symmetric keys, passphrases,
//! derived secrets).
//!
//! ## Ownership Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SENSITIVE BYTES LIFECYCLE                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SensitiveBytes::new(vec) ──► exactly one owner, no Clone, no serde    │
//! │            │                                                            │
//! │            ├── as_bytes()    read access through the explicit accessor │
//! │            │                                                            │
//! │            ├── wipe()        overwrite with zeros, idempotent,         │
//! │            │                 called on every error path that no        │
//! │            │                 longer needs the value                    │
//! │            │                                                            │
//! │            └── Drop          wipes automatically as a backstop         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The type deliberately implements neither `Clone` nor `serde` traits:
//! secret material must never be copied implicitly or serialized. Callers
//! that need the bytes elsewhere take them through [`SensitiveBytes::as_bytes`]
//! and are responsible for the destination.

use zeroize::Zeroize;

use crate::crypto::bytes::random_bytes;

/// An owned byte buffer holding secret material.
///
/// Wipes its contents with zeros on [`wipe`](Self::wipe) and on drop.
pub struct SensitiveBytes {
    bytes: Vec<u8>,
    wiped: bool,
}

impl SensitiveBytes {
    /// Take ownership of secret bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, wiped: false }
    }

    /// Generate `len` cryptographically random secret bytes.
    pub fn random(len: usize) -> Self {
        Self::new(random_bytes(len))
    }

    /// Read access to the raw bytes.
    ///
    /// This is the only read path; the buffer is never exposed through
    /// `Debug`, `Display`, or serialization.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Overwrite the contents with zeros.
    ///
    /// Idempotent; safe to call on every error path. The buffer keeps its
    /// length so accidental later reads see zeros, not stale secrets.
    pub fn wipe(&mut self) {
        // Zeroize the slice, not the Vec: zeroizing a Vec also clears
        // it, and the buffer must keep its length.
        self.bytes.as_mut_slice().zeroize();
        self.wiped = true;
    }

    /// True once [`wipe`](Self::wipe) has run.
    pub fn is_wiped(&self) -> bool {
        self.wiped
    }
}

impl Drop for SensitiveBytes {
    fn drop(&mut self) {
        self.wipe();
    }
}

// Debug intentionally redacts the contents.
impl std::fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveBytes")
            .field("len", &self.bytes.len())
            .field("wiped", &self.wiped)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_returns_original_bytes() {
        let buf = SensitiveBytes::new(vec![1, 2, 3, 4]);
        assert_eq!(buf.as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(buf.len(), 4);
        assert!(!buf.is_empty());
    }

    #[test]
    fn test_wipe_zeroes_contents() {
        let mut buf = SensitiveBytes::new(vec![0xAA; 16]);
        buf.wipe();

        assert!(buf.is_wiped());
        // The buffer keeps its length; reads see zeros, not emptiness
        assert_eq!(buf.len(), 16);
        assert_eq!(buf.as_bytes(), &[0u8; 16]);
    }

    #[test]
    fn test_wipe_is_idempotent() {
        let mut buf = SensitiveBytes::new(vec![0xAA; 16]);
        buf.wipe();
        buf.wipe();

        assert!(buf.is_wiped());
        assert_eq!(buf.as_bytes(), &[0u8; 16]);
    }

    #[test]
    fn test_random_has_requested_length() {
        let buf = SensitiveBytes::random(16);
        assert_eq!(buf.len(), 16);
        // Not all zeros (probability ~2^-128)
        assert_ne!(buf.as_bytes(), &[0u8; 16]);
    }

    #[test]
    fn test_debug_redacts_contents() {
        let buf = SensitiveBytes::new(vec![0xAA; 4]);
        let rendered = format!("{:?}", buf);
        assert!(!rendered.contains("170")); // 0xAA
        assert!(rendered.contains("len"));
    }
}
