//! # Cryptography Module
//!
//! All cryptographic primitives used by the client core.
//!
//! ## Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CRYPTO SUBSYSTEM                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  sensitive   SensitiveBytes, explicit-wipe secret buffers              │
//! │  bytes       concatenation/splitting, random bytes, i32 codec          │
//! │  hashing     SHA-256, XOR-folded reduction, HKDF-SHA256                │
//! │  cbc         AES-128-CBC with PKCS7                                    │
//! │  stream      chunk-chained streaming CBC                               │
//! │  ecc         P-256/P-384 keypairs, JWK/DER interchange, ECDH           │
//! │  envelope    KeyHeader / EncryptedKeyHeader content-key wrapping       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bytes;
pub mod cbc;
pub mod ecc;
pub mod envelope;
pub mod hashing;
pub mod sensitive;
pub mod stream;

pub use ecc::{EccCurve, EccKeyPair, EccPrivateKey, EccPublicKey, Jwk};
pub use envelope::{EncryptedKeyHeader, KeyHeader, ENCRYPTION_VERSION};
pub use sensitive::SensitiveBytes;
pub use stream::{CbcStreamDecryptor, CbcStreamEncryptor};
