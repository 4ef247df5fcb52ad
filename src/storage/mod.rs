//! # Storage Module
//!
//! Credential persistence behind a platform-agnostic trait.

pub mod secure_store;

pub use secure_store::{keys, CredentialStore, MemoryCredentialStore};
