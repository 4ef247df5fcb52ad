//! # Authentication Module
//!
//! The browser-redirect login handshake with an identity host.
//!
//! ## Handshake Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        LOGIN HANDSHAKE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  begin_auth(identity)                                                  │
//! │    1. generate 16-byte passphrase + ephemeral P-384 keypair (1h TTL)   │
//! │    2. register pending attempt under a random state token              │
//! │    3. open the host's authorize URL in the browser                     │
//! │       (embeds base64url JWK public key + permission request)           │
//! │                                                                         │
//! │  handle_callback(redirect_url)                                         │
//! │    4. claim the pending attempt by state token (unknown ──► ignore)    │
//! │    5. ECDH with the host's ephemeral key + HKDF(salt) ──► secret       │
//! │    6. POST base64(SHA-256(secret)) to the token endpoint               │
//! │    7. decrypt shared secret + auth token from the response             │
//! │    8. persist credentials, announce Authenticated                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Machine
//!
//! ```text
//!                 begin_auth            callback ok
//!  Unauthenticated ────────► Authenticating ────────► Authenticated
//!        ▲                        │                        │
//!        │       cancel_auth      │ exchange failed        │ logout
//!        └────────────────────────┼────────────────────────┘
//!                                 ▼
//!                              Failed
//! ```
//!
//! Network failures during the handshake land in `Failed` and are
//! observable on the state stream; cryptographic failures additionally
//! surface as typed errors. A callback with an unknown state token is
//! logged and ignored so a hostile redirect cannot disturb a live
//! attempt.

pub mod params;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::watch;
use uuid::Uuid;

use crate::crypto::ecc::{base64_decode, base64_encode, EccCurve, EccKeyPair, EccPublicKey};
use crate::crypto::hashing::sha256;
use crate::crypto::sensitive::SensitiveBytes;
use crate::crypto::cbc;
use crate::error::{Error, Result};
use crate::storage::{keys as storage_keys, CredentialStore};
use crate::time::{now_timestamp_millis, MILLIS_PER_HOUR};

use self::params::{
    AppPermissionParams, AuthorizationParams, CallbackParams, TokenRequest, TokenResponse,
};

/// Default time allowed for the token exchange round trip.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Observable login state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// No session and no attempt in flight
    Unauthenticated,
    /// An authorization attempt is waiting for its callback
    Authenticating,
    /// A session is established for this identity
    Authenticated {
        /// The logged-in identity's domain
        identity: String,
    },
    /// The last attempt failed
    Failed {
        /// Human-readable failure cause
        reason: String,
    },
}

/// Credentials produced by a completed handshake.
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// The authenticated identity's domain
    pub identity: String,
    /// Client auth token, base64
    pub client_auth_token: String,
    /// Session shared secret, base64
    pub shared_secret: String,
}

impl AuthResult {
    /// Decode the shared secret into a wipeable buffer.
    pub fn shared_secret_bytes(&self) -> Result<SensitiveBytes> {
        Ok(SensitiveBytes::new(base64_decode(&self.shared_secret)?))
    }
}

/// Opens the authorization URL in the user's browser.
pub trait BrowserLauncher: Send + Sync {
    /// Open `url`; return an error if no browser could be launched.
    fn launch(&self, url: &str) -> Result<()>;
}

/// The host's token exchange endpoint.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// POST the secret digest to `identity`'s token endpoint.
    async fn exchange_digest(&self, identity: &str, request: &TokenRequest)
        -> Result<TokenResponse>;
}

/// Static client identity presented on every authorization request.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Identifier the host shows the user (the app's domain)
    pub client_id: String,
    /// Free-form client description
    pub client_info: String,
    /// Where the host redirects after approval
    pub redirect_uri: String,
}

/// One attempt waiting for its callback.
struct PendingHandshake {
    passphrase: SensitiveBytes,
    keypair: EccKeyPair,
}

/// Drives login attempts and owns the session state stream.
///
/// Collaborators are injected: credential persistence, browser
/// launching, and the HTTP token exchange all live behind traits so
/// each platform shell supplies its own.
pub struct HandshakeManager {
    config: HandshakeConfig,
    pending: RwLock<HashMap<String, PendingHandshake>>,
    state_tx: watch::Sender<HandshakeState>,
    store: Arc<dyn CredentialStore>,
    browser: Arc<dyn BrowserLauncher>,
    tokens: Arc<dyn TokenEndpoint>,
    exchange_timeout: Duration,
}

impl HandshakeManager {
    /// Create a manager in the `Unauthenticated` state.
    pub fn new(
        config: HandshakeConfig,
        store: Arc<dyn CredentialStore>,
        browser: Arc<dyn BrowserLauncher>,
        tokens: Arc<dyn TokenEndpoint>,
    ) -> Self {
        let (state_tx, _) = watch::channel(HandshakeState::Unauthenticated);
        Self {
            config,
            pending: RwLock::new(HashMap::new()),
            state_tx,
            store,
            browser,
            tokens,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    /// Override the token exchange timeout.
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    /// Subscribe to login state changes.
    ///
    /// The receiver immediately holds the current state.
    pub fn subscribe(&self) -> watch::Receiver<HandshakeState> {
        self.state_tx.subscribe()
    }

    /// The current login state.
    pub fn current_state(&self) -> HandshakeState {
        self.state_tx.borrow().clone()
    }

    /// Start a login attempt against `identity`'s host.
    ///
    /// Generates the ephemeral key material, registers the attempt, and
    /// opens the authorization URL in the browser. Returns the URL that
    /// was opened; the attempt completes later via
    /// [`handle_callback`](Self::handle_callback).
    pub fn begin_auth(&self, identity: &str, permissions: &AppPermissionParams) -> Result<String> {
        let passphrase = SensitiveBytes::new(Uuid::new_v4().as_bytes().to_vec());
        let keypair =
            EccKeyPair::generate(passphrase.as_bytes(), EccCurve::P384, MILLIS_PER_HOUR)?;
        let state = Uuid::new_v4().to_string();

        let auth_params = AuthorizationParams {
            client_id: self.config.client_id.clone(),
            client_type: "app".to_string(),
            client_info: self.config.client_info.clone(),
            public_key: keypair.public.to_jwk_base64url()?,
            permission_request: permissions.to_json()?,
            state: state.clone(),
            redirect_uri: self.config.redirect_uri.clone(),
        };
        let url = auth_params.to_url(&format!(
            "https://{}/api/owner/v1/auth/authorize",
            identity
        ));

        self.pending
            .write()
            .insert(state.clone(), PendingHandshake { passphrase, keypair });

        if let Err(e) = self.browser.launch(&url) {
            self.pending.write().remove(&state);
            self.set_state(HandshakeState::Failed {
                reason: e.to_string(),
            });
            return Err(e);
        }

        tracing::info!(identity, state = %state, "authorization started");
        self.set_state(HandshakeState::Authenticating);
        Ok(url)
    }

    /// Complete a login attempt from the host's redirect.
    ///
    /// Returns `Ok(None)` when the callback does not belong to a live
    /// attempt or when the token exchange fails over the network (the
    /// failure is announced on the state stream). Cryptographic
    /// failures surface as errors.
    pub async fn handle_callback(&self, callback_url: &str) -> Result<Option<AuthResult>> {
        let params = CallbackParams::from_url(callback_url)?;

        // Claiming the pending entry is atomic; a second callback or a
        // callback after cancellation finds nothing.
        let pending = match self.pending.write().remove(&params.state) {
            Some(p) => p,
            None => {
                tracing::warn!(state = %params.state, "callback with unknown state token, ignoring");
                return Ok(None);
            }
        };

        let result = self.complete_handshake(pending, &params).await;
        match result {
            Ok(auth) => {
                self.set_state(HandshakeState::Authenticated {
                    identity: auth.identity.clone(),
                });
                tracing::info!(identity = %auth.identity, "authenticated");
                Ok(Some(auth))
            }
            Err(e) if e.is_recoverable() => {
                // Network-shaped failure: announce and swallow.
                tracing::warn!(error = %e, "token exchange failed");
                self.set_state(HandshakeState::Failed {
                    reason: e.to_string(),
                });
                Ok(None)
            }
            Err(e) => {
                self.set_state(HandshakeState::Failed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn complete_handshake(
        &self,
        pending: PendingHandshake,
        params: &CallbackParams,
    ) -> Result<AuthResult> {
        let remote = EccPublicKey::from_jwk_base64url(&params.public_key, 0)?;
        let salt = base64_decode(&params.salt)?;

        let mut exchanged =
            pending
                .keypair
                .ecdh(pending.passphrase.as_bytes(), &remote, &salt)?;

        let request = TokenRequest {
            secret_digest: base64_encode(&sha256(exchanged.as_bytes())),
        };
        let response = match tokio::time::timeout(
            self.exchange_timeout,
            self.tokens.exchange_digest(&params.identity, &request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("token exchange".to_string())),
        };
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                exchanged.wipe();
                return Err(e);
            }
        };

        let auth = self.decrypt_token_response(&params.identity, exchanged.as_bytes(), &response);
        exchanged.wipe();
        let auth = auth?;

        self.store.put(storage_keys::IDENTITY, &auth.identity)?;
        self.store
            .put(storage_keys::CLIENT_AUTH_TOKEN, &auth.client_auth_token)?;
        self.store
            .put(storage_keys::SHARED_SECRET, &auth.shared_secret)?;
        Ok(auth)
    }

    fn decrypt_token_response(
        &self,
        identity: &str,
        exchanged: &[u8],
        response: &TokenResponse,
    ) -> Result<AuthResult> {
        let shared_secret = cbc::decrypt(
            &base64_decode(&response.base64_shared_secret_cipher)?,
            exchanged,
            &base64_decode(&response.base64_shared_secret_iv)?,
        )?;
        let client_auth_token = cbc::decrypt(
            &base64_decode(&response.base64_client_auth_token_cipher)?,
            exchanged,
            &base64_decode(&response.base64_client_auth_token_iv)?,
        )?;

        Ok(AuthResult {
            identity: identity.to_string(),
            client_auth_token: base64_encode(&client_auth_token),
            shared_secret: base64_encode(&shared_secret),
        })
    }

    /// Abandon a pending attempt.
    ///
    /// A later callback carrying this state token will be ignored.
    pub fn cancel_auth(&self, state: &str) {
        if self.pending.write().remove(state).is_some() {
            tracing::info!(state, "authorization cancelled");
            if matches!(self.current_state(), HandshakeState::Authenticating) {
                self.set_state(HandshakeState::Unauthenticated);
            }
        }
    }

    /// Treat pending attempts older than `grace_millis` as abandoned.
    ///
    /// Called when the host application resumes: a callback that never
    /// arrived within the grace period means the user walked away. If
    /// the sweep empties the registry while `Authenticating`, the state
    /// returns to `Unauthenticated`. Returns the number removed.
    pub fn cancel_expired(&self, grace_millis: i64) -> usize {
        let now = now_timestamp_millis();
        let mut pending = self.pending.write();
        let before = pending.len();
        pending.retain(|_, p| now - p.keypair.private.created_at <= grace_millis);
        let removed = before - pending.len();
        let drained = pending.is_empty();
        drop(pending);

        if removed > 0 {
            tracing::info!(removed, "abandoned authorization attempts dropped");
            if drained && matches!(self.current_state(), HandshakeState::Authenticating) {
                self.set_state(HandshakeState::Unauthenticated);
            }
        }
        removed
    }

    /// Restore a persisted session, if the store holds a complete one.
    pub fn restore_session(&self) -> Result<Option<AuthResult>> {
        let identity = self.store.get(storage_keys::IDENTITY)?;
        let token = self.store.get(storage_keys::CLIENT_AUTH_TOKEN)?;
        let secret = self.store.get(storage_keys::SHARED_SECRET)?;

        match (identity, token, secret) {
            (Some(identity), Some(client_auth_token), Some(shared_secret)) => {
                self.set_state(HandshakeState::Authenticated {
                    identity: identity.clone(),
                });
                tracing::info!(identity = %identity, "session restored");
                Ok(Some(AuthResult {
                    identity,
                    client_auth_token,
                    shared_secret,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Drop the persisted session and return to `Unauthenticated`.
    pub fn logout(&self) -> Result<()> {
        self.store.remove(storage_keys::IDENTITY)?;
        self.store.remove(storage_keys::CLIENT_AUTH_TOKEN)?;
        self.store.remove(storage_keys::SHARED_SECRET)?;
        self.set_state(HandshakeState::Unauthenticated);
        tracing::info!("logged out");
        Ok(())
    }

    fn set_state(&self, state: HandshakeState) {
        self.state_tx.send_replace(state);
    }
}

// ============================================================================
// TESTS
// ============================================================================
