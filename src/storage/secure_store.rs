//! # Credential Storage
//!
//! Persistence for session credentials between app launches.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CREDENTIAL STORAGE                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  CredentialStore Trait                                          │   │
//! │  │  ─────────────────────                                           │   │
//! │  │                                                                 │   │
//! │  │  • get(key)            - Read a stored value                   │   │
//! │  │  • put(key, value)     - Store a value                         │   │
//! │  │  • remove(key)         - Delete a value                        │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  What We Store:                                                        │
//! │  ───────────────                                                        │
//! │                                                                         │
//! │  1. Identity        - The authenticated identity's domain              │
//! │  2. Auth token      - The client auth token, base64                    │
//! │  3. Shared secret   - The session shared secret, base64                │
//! │                                                                         │
//! │  Host applications back this with the platform keychain/keystore;      │
//! │  the in-memory implementation covers tests and ephemeral sessions.     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;

/// Key names for credential storage
pub mod keys {
    /// The authenticated identity's domain
    pub const IDENTITY: &str = "haven.auth.identity";

    /// The client auth token, base64
    pub const CLIENT_AUTH_TOKEN: &str = "haven.auth.token";

    /// The session shared secret, base64
    pub const SHARED_SECRET: &str = "haven.auth.shared_secret";
}

/// Platform-agnostic credential persistence.
///
/// Implementations must be safe to call from multiple tasks; values
/// are small strings (identities and base64 secrets).
pub trait CredentialStore: Send + Sync {
    /// Read a stored value, `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory credential store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get(keys::IDENTITY).unwrap(), None);

        store.put(keys::IDENTITY, "alice.example.com").unwrap();
        assert_eq!(
            store.get(keys::IDENTITY).unwrap().as_deref(),
            Some("alice.example.com")
        );

        store.remove(keys::IDENTITY).unwrap();
        assert_eq!(store.get(keys::IDENTITY).unwrap(), None);
    }

    #[test]
    fn test_put_replaces_existing_value() {
        let store = MemoryCredentialStore::new();
        store.put(keys::SHARED_SECRET, "old").unwrap();
        store.put(keys::SHARED_SECRET, "new").unwrap();
        assert_eq!(store.get(keys::SHARED_SECRET).unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let store = MemoryCredentialStore::new();
        assert!(store.remove("haven.auth.missing").is_ok());
    }
}
