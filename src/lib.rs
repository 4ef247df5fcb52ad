//! # Haven Core
//!
//! The security core for a multi-platform identity-host client:
//! key agreement, login handshake, envelope encryption, and
//! application-layer transport encryption.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         HAVEN CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────────────────┐    │
//! │  │       Auth          │        │           Transport             │    │
//! │  │                     │        │                                 │    │
//! │  │ - Handshake states  │        │ - Query-string encryption       │    │
//! │  │ - Browser redirect  │        │ - Body envelopes                │    │
//! │  │ - Token exchange    │        │ - Response decryption           │    │
//! │  └──────────┬──────────┘        └───────────────┬─────────────────┘    │
//! │             │                                   │                      │
//! │             └───────────────┬───────────────────┘                      │
//! │                             │                                          │
//! │  ┌─────────────┐  ┌─────────▼──────┐  ┌──────────────────────────┐    │
//! │  │   Storage   │  │     Crypto     │  │          Error           │    │
//! │  │             │  │                │  │                          │    │
//! │  │ - Trait     │  │ - P-256/P-384  │  │ - Typed taxonomy         │    │
//! │  │ - In-memory │  │ - AES-128-CBC  │  │ - Stable codes           │    │
//! │  │             │  │ - Envelopes    │  │ - Recoverability         │    │
//! │  └─────────────┘  └────────────────┘  └──────────────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Cryptographic primitives (ECC, CBC, envelopes, streaming)
//! - [`auth`] - The browser-redirect login handshake
//! - [`transport`] - Application-layer request/response encryption
//! - [`storage`] - Credential persistence behind a trait
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY LAYERS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Layer 1: Login Key Agreement (NIST ECDH + HKDF-SHA256)                │
//! │  ───────────────────────────────────────────────────────                │
//! │  Each login attempt uses a fresh P-384 keypair with a one-hour         │
//! │  lifetime. The exchanged secret exists only for the token round        │
//! │  trip and is wiped afterwards.                                         │
//! │                                                                         │
//! │  Layer 2: Transport Encryption (AES-128-CBC under the session secret)  │
//! │  ─────────────────────────────────────────────────────────────────────  │
//! │  Query strings and bodies are encrypted inside TLS, so the host's      │
//! │  front-end infrastructure never sees request parameters.               │
//! │                                                                         │
//! │  Layer 3: Content Envelopes (per-payload keys wrapped by a master key) │
//! │  ─────────────────────────────────────────────────────────────────────  │
//! │  Every payload gets its own content key; compromising one payload      │
//! │  key exposes nothing else.                                             │
//! │                                                                         │
//! │  Layer 4: Key Material Hygiene (explicit wipe + zeroize on drop)       │
//! │  ──────────────────────────────────────────────────────────────         │
//! │  Secrets live in wipeable buffers; private keys are stored only        │
//! │  passphrase-wrapped with a hash check before every unwrap.             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod auth;
pub mod crypto;
pub mod error;
pub mod storage;
/// UTC time utilities.
pub mod time;
pub mod transport;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use auth::{AuthResult, HandshakeConfig, HandshakeManager, HandshakeState};
pub use crypto::{
    EccCurve, EccKeyPair, EccPublicKey, EncryptedKeyHeader, KeyHeader, SensitiveBytes,
};
pub use error::{Error, Result};
pub use storage::{CredentialStore, MemoryCredentialStore};
