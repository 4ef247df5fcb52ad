//! # Error Handling
//!
//! This module provides the error types for Haven Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── IncorrectKey          - Wrong passphrase/unwrap key           │
//! │  │   ├── InvalidArgument       - Malformed salt/IV/key length          │
//! │  │   ├── InvalidKeyFormat      - Bad JWK/DER key material              │
//! │  │   ├── UnsupportedVersion    - Unknown envelope version              │
//! │  │   ├── EncryptionFailed      - Cipher operation failed               │
//! │  │   ├── DecryptionFailed      - Cipher/padding validation failed      │
//! │  │   └── KeyDerivationFailed   - HKDF expansion failed                 │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                    │
//! │  │   ├── StorageReadError      - Failed to read from credential store  │
//! │  │   └── StorageWriteError     - Failed to write to credential store   │
//! │  │                                                                      │
//! │  ├── Handshake / Network Errors                                        │
//! │  │   ├── HandshakeFailed       - Non-success at a handshake step       │
//! │  │   ├── Timeout               - Network-bounded step timed out        │
//! │  │   └── BrowserLaunchFailed   - Redirect launcher refused the URL     │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── SerializationError    - Failed to encode a wire shape         │
//! │      ├── DeserializationError  - Failed to decode a wire shape         │
//! │      └── Internal              - Should not happen                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation policy
//!
//! Cryptographic invariant violations (wrong key, bad lengths, unsupported
//! version) always surface to the caller as typed failures and are never
//! swallowed. Network failures during the handshake are recovered into the
//! `Failed` state of the state machine rather than thrown past its
//! boundary. Transport-layer decrypt failures on responses are recovered
//! locally with a logged warning and pass-through (see [`crate::transport`]).

use thiserror::Error;

/// Result type alias for Haven Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Haven Core
///
/// All errors are categorized by module/domain to make error handling
/// clearer and to provide meaningful error messages to host applications.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================
    /// Wrong passphrase or unwrap key presented for protected key material.
    /// Decryption is never attempted with a mismatched key.
    #[error("Incorrect key")]
    IncorrectKey,

    /// Malformed argument (salt, IV, or key of the wrong length, empty data)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Key material could not be parsed (bad JWK or DER)
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Unknown envelope encryption version
    #[error("Unsupported encryption version: {0}")]
    UnsupportedVersion(i32),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (including PKCS7 padding validation)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Storage Errors (400-499)
    // ========================================================================
    /// Failed to read from the credential store
    #[error("Failed to read from storage: {0}")]
    StorageReadError(String),

    /// Failed to write to the credential store
    #[error("Failed to write to storage: {0}")]
    StorageWriteError(String),

    // ========================================================================
    // Handshake / Network Errors (500-599)
    // ========================================================================
    /// A handshake network step returned a non-success result
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    /// A network-bounded operation timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The browser/redirect launcher could not open the authorization URL
    #[error("Failed to launch browser: {0}")]
    BrowserLaunchFailed(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the stable numeric code for host applications
    ///
    /// Error codes are organized by category:
    /// - 300-399: Crypto
    /// - 400-499: Storage
    /// - 500-599: Handshake / network
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Crypto (300-399)
            Error::IncorrectKey => 300,
            Error::InvalidArgument(_) => 301,
            Error::InvalidKeyFormat(_) => 302,
            Error::UnsupportedVersion(_) => 303,
            Error::EncryptionFailed(_) => 304,
            Error::DecryptionFailed(_) => 305,
            Error::KeyDerivationFailed(_) => 306,

            // Storage (400-499)
            Error::StorageReadError(_) => 400,
            Error::StorageWriteError(_) => 401,

            // Handshake / network (500-599)
            Error::HandshakeFailed(_) => 500,
            Error::Timeout(_) => 501,
            Error::BrowserLaunchFailed(_) => 502,

            // Internal (900-999)
            Error::SerializationError(_) => 900,
            Error::DeserializationError(_) => 901,
            Error::Internal(_) => 902,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors can potentially be resolved by retrying or by
    /// user action (e.g. starting a fresh login attempt).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::HandshakeFailed(_) | Error::BrowserLaunchFailed(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
