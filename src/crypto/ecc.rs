//! # ECC Key Agreement
//!
//! NIST-curve keypairs for the login key agreement with the identity
//! host, plus the interchange formats the host speaks.
//!
//! ## Key Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ECC KEY LIFECYCLE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  EccKeyPair::generate(passphrase, curve, ttl)                          │
//! │       │                                                                 │
//! │       ├── public half:  SPKI DER + CRC32C tag + expiration             │
//! │       │        │                                                        │
//! │       │        └── to_jwk() ──► {kty, crv, x, y}  (sent to the host)   │
//! │       │                                                                 │
//! │       └── private half: PKCS#8 DER wrapped under the passphrase        │
//! │                │         (AES-CBC, random IV, XOR-folded key hash)     │
//! │                │                                                        │
//! │                └── unwrap(passphrase) ──► raw DER, only in memory,     │
//! │                         only after the key hash matches                │
//! │                                                                         │
//! │  ecdh(passphrase, remote_public, salt)                                 │
//! │       raw shared point ──► HKDF-SHA256(salt) ──► 16-byte secret        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The private half never exists unencrypted outside a [`SensitiveBytes`]
//! buffer. The key hash lets a wrong passphrase fail deterministically
//! before any decryption is attempted.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use p256::elliptic_curve::generic_array::GenericArray;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::bytes::{constant_time_eq, random_bytes};
use crate::crypto::cbc;
use crate::crypto::hashing::{hkdf_sha256, reduce_sha256};
use crate::crypto::sensitive::SensitiveBytes;
use crate::error::{Error, Result};
use crate::time::now_timestamp_millis;

/// Length of the symmetric passphrase wrapping private keys.
pub const PASSPHRASE_LEN: usize = 16;

/// Length of the secret derived by [`EccKeyPair::ecdh`].
pub const EXCHANGED_SECRET_LEN: usize = 16;

/// Supported NIST curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EccCurve {
    /// secp256r1 / prime256v1
    P256,
    /// secp384r1
    P384,
}

impl EccCurve {
    /// Affine coordinate width in bytes.
    pub fn coordinate_len(&self) -> usize {
        match self {
            EccCurve::P256 => 32,
            EccCurve::P384 => 48,
        }
    }

    /// The JWK `crv` name for this curve.
    pub fn jwk_name(&self) -> &'static str {
        match self {
            EccCurve::P256 => "P-256",
            EccCurve::P384 => "P-384",
        }
    }

    fn from_jwk_name(name: &str) -> Result<Self> {
        match name {
            "P-256" => Ok(EccCurve::P256),
            "P-384" => Ok(EccCurve::P384),
            other => Err(Error::InvalidKeyFormat(format!(
                "unsupported JWK curve: {}",
                other
            ))),
        }
    }
}

/// An elliptic-curve public key in JSON Web Key form.
///
/// Coordinates are base64url without padding, always the full
/// coordinate width of the curve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    /// Key type; always "EC"
    pub kty: String,
    /// Curve name ("P-256" or "P-384")
    pub crv: String,
    /// Affine x coordinate, base64url
    pub x: String,
    /// Affine y coordinate, base64url
    pub y: String,
}

/// The shareable half of an ECC keypair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EccPublicKey {
    /// Curve this key lives on
    pub curve: EccCurve,
    /// SubjectPublicKeyInfo DER encoding
    #[serde(with = "base64_bytes")]
    pub public_key_der: Vec<u8>,
    /// CRC32C over the DER bytes, an integrity tag for stored copies
    pub crc32c: u32,
    /// Expiration as Unix milliseconds
    pub expiration: i64,
}

impl EccPublicKey {
    /// Wrap SPKI DER bytes, computing the integrity tag.
    pub fn from_der(curve: EccCurve, public_key_der: Vec<u8>, expiration: i64) -> Result<Self> {
        // Parse once so malformed DER is rejected at construction.
        parse_public(curve, &public_key_der)?;
        let crc32c = crc32c::crc32c(&public_key_der);
        Ok(Self {
            curve,
            public_key_der,
            crc32c,
            expiration,
        })
    }

    /// Check the stored CRC32C tag against the DER bytes.
    pub fn verify_crc(&self) -> bool {
        crc32c::crc32c(&self.public_key_der) == self.crc32c
    }

    /// Whether the key has expired at the current time.
    pub fn is_expired(&self) -> bool {
        now_timestamp_millis() >= self.expiration
    }

    /// Export as a JWK.
    pub fn to_jwk(&self) -> Result<Jwk> {
        let (x, y) = affine_coordinates(self.curve, &self.public_key_der)?;
        Ok(Jwk {
            kty: "EC".to_string(),
            crv: self.curve.jwk_name().to_string(),
            x: URL_SAFE_NO_PAD.encode(x),
            y: URL_SAFE_NO_PAD.encode(y),
        })
    }

    /// Export as base64url over the JWK JSON, the form embedded in
    /// authorization URLs.
    pub fn to_jwk_base64url(&self) -> Result<String> {
        let json = serde_json::to_string(&self.to_jwk()?)?;
        Ok(URL_SAFE_NO_PAD.encode(json.as_bytes()))
    }

    /// Import from a JWK.
    ///
    /// Coordinates shorter than the curve width are accepted and
    /// left-padded with zeros; some peers strip leading zero bytes.
    pub fn from_jwk(jwk: &Jwk, expiration: i64) -> Result<Self> {
        if jwk.kty != "EC" {
            return Err(Error::InvalidKeyFormat(format!(
                "unsupported JWK key type: {}",
                jwk.kty
            )));
        }
        let curve = EccCurve::from_jwk_name(&jwk.crv)?;
        let x = decode_coordinate(&jwk.x, curve.coordinate_len())?;
        let y = decode_coordinate(&jwk.y, curve.coordinate_len())?;
        let der = der_from_coordinates(curve, &x, &y)?;
        Self::from_der(curve, der, expiration)
    }

    /// Import from base64url over the JWK JSON.
    pub fn from_jwk_base64url(encoded: &str, expiration: i64) -> Result<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| Error::InvalidKeyFormat(format!("bad base64url JWK: {}", e)))?;
        let jwk: Jwk = serde_json::from_slice(&json)
            .map_err(|e| Error::InvalidKeyFormat(format!("bad JWK JSON: {}", e)))?;
        Self::from_jwk(&jwk, expiration)
    }
}

/// The wrapped private half of an ECC keypair.
///
/// Holds only ciphertext; unwrapping requires the original passphrase
/// and goes through [`EccKeyPair::unwrap_private_key`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EccPrivateKey {
    /// PKCS#8 DER, AES-CBC encrypted under the passphrase
    #[serde(with = "base64_bytes")]
    pub encrypted_key: Vec<u8>,
    /// IV used for the wrap
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,
    /// XOR-folded SHA-256 of the passphrase, checked before unwrap
    #[serde(with = "base64_bytes")]
    pub key_hash: Vec<u8>,
    /// Creation time as Unix milliseconds
    pub created_at: i64,
}

impl EccPrivateKey {
    /// Wrap raw PKCS#8 DER under a 16-byte passphrase.
    ///
    /// Generates a random IV, encrypts the DER, and records the
    /// passphrase hash for the pre-unwrap check. The plaintext stays
    /// the caller's responsibility to wipe.
    pub fn create(passphrase: &[u8], raw_der: &[u8]) -> Result<Self> {
        if passphrase.len() != PASSPHRASE_LEN {
            return Err(Error::InvalidArgument(format!(
                "passphrase must be {} bytes, got {}",
                PASSPHRASE_LEN,
                passphrase.len()
            )));
        }
        let iv = random_bytes(cbc::BLOCK_SIZE);
        let encrypted_key = cbc::encrypt(raw_der, passphrase, &iv)?;
        Ok(Self {
            encrypted_key,
            iv,
            key_hash: reduce_sha256(passphrase).to_vec(),
            created_at: now_timestamp_millis(),
        })
    }
}

/// An ephemeral ECC keypair for one login attempt.
#[derive(Serialize, Deserialize)]
pub struct EccKeyPair {
    /// Shareable public half
    pub public: EccPublicKey,
    /// Passphrase-wrapped private half
    pub private: EccPrivateKey,
    // Plaintext DER after the first successful unwrap; wiped on drop.
    #[serde(skip)]
    unwrapped: Mutex<Option<Vec<u8>>>,
}

impl EccKeyPair {
    /// Generate a fresh keypair, wrapping the private half immediately.
    ///
    /// `ttl_millis` sets the public key's expiration relative to now and
    /// must be positive. The passphrase is the 16-byte AES wrap key.
    pub fn generate(passphrase: &[u8], curve: EccCurve, ttl_millis: i64) -> Result<Self> {
        if ttl_millis <= 0 {
            return Err(Error::InvalidArgument(format!(
                "key TTL must be positive, got {}",
                ttl_millis
            )));
        }

        let (public_der, mut private_der) = generate_der_pair(curve)?;
        let private = EccPrivateKey::create(passphrase, &private_der)?;
        private_der.as_mut_slice().zeroize();

        let public = EccPublicKey::from_der(curve, public_der, private.created_at + ttl_millis)?;
        Ok(Self {
            public,
            private,
            unwrapped: Mutex::new(None),
        })
    }

    /// Unwrap the private half into raw PKCS#8 DER.
    ///
    /// Fails with [`Error::IncorrectKey`] if the passphrase hash does
    /// not match; the ciphertext is never touched in that case. After
    /// the first successful unwrap the plaintext is cached for the
    /// keypair's lifetime, so repeat calls skip the decryption.
    pub fn unwrap_private_key(&self, passphrase: &[u8]) -> Result<SensitiveBytes> {
        if !constant_time_eq(&reduce_sha256(passphrase), &self.private.key_hash) {
            return Err(Error::IncorrectKey);
        }
        if let Some(der) = self.unwrapped.lock().as_ref() {
            return Ok(SensitiveBytes::new(der.clone()));
        }
        let der = cbc::decrypt(&self.private.encrypted_key, passphrase, &self.private.iv)?;
        *self.unwrapped.lock() = Some(der.clone());
        Ok(SensitiveBytes::new(der))
    }

    /// Derive the 16-byte exchanged secret with a remote public key.
    ///
    /// ```text
    /// raw = ECDH(our_private, remote_public)
    /// secret = HKDF-SHA256(ikm = raw, salt, out = 16)
    /// ```
    ///
    /// The salt must be at least 16 bytes; the remote key must live on
    /// the same curve as ours.
    pub fn ecdh(
        &self,
        passphrase: &[u8],
        remote: &EccPublicKey,
        salt: &[u8],
    ) -> Result<SensitiveBytes> {
        if salt.len() < 16 {
            return Err(Error::InvalidArgument(format!(
                "salt must be at least 16 bytes, got {}",
                salt.len()
            )));
        }
        if remote.curve != self.public.curve {
            return Err(Error::InvalidArgument(format!(
                "curve mismatch: ours is {:?}, remote is {:?}",
                self.public.curve, remote.curve
            )));
        }

        let mut private_der = self.unwrap_private_key(passphrase)?;
        let result = raw_ecdh(self.public.curve, private_der.as_bytes(), &remote.public_key_der)
            .and_then(|mut raw| {
                let okm = hkdf_sha256(&raw, salt, EXCHANGED_SECRET_LEN);
                raw.iter_mut().for_each(|b| *b = 0);
                okm
            });
        private_der.wipe();
        Ok(SensitiveBytes::new(result?))
    }
}

impl Drop for EccKeyPair {
    fn drop(&mut self) {
        if let Some(der) = self.unwrapped.get_mut().as_mut() {
            der.zeroize();
        }
    }
}

// ============================================================================
// CURVE DISPATCH
// ============================================================================

fn generate_der_pair(curve: EccCurve) -> Result<(Vec<u8>, Vec<u8>)> {
    match curve {
        EccCurve::P256 => {
            let secret = p256::SecretKey::random(&mut OsRng);
            let public_der = secret
                .public_key()
                .to_public_key_der()
                .map_err(|e| Error::Internal(format!("SPKI encode: {}", e)))?
                .into_vec();
            let private_der = secret
                .to_pkcs8_der()
                .map_err(|e| Error::Internal(format!("PKCS#8 encode: {}", e)))?
                .as_bytes()
                .to_vec();
            Ok((public_der, private_der))
        }
        EccCurve::P384 => {
            let secret = p384::SecretKey::random(&mut OsRng);
            let public_der = secret
                .public_key()
                .to_public_key_der()
                .map_err(|e| Error::Internal(format!("SPKI encode: {}", e)))?
                .into_vec();
            let private_der = secret
                .to_pkcs8_der()
                .map_err(|e| Error::Internal(format!("PKCS#8 encode: {}", e)))?
                .as_bytes()
                .to_vec();
            Ok((public_der, private_der))
        }
    }
}

fn parse_public(curve: EccCurve, der: &[u8]) -> Result<()> {
    match curve {
        EccCurve::P256 => {
            p256::PublicKey::from_public_key_der(der)
                .map_err(|e| Error::InvalidKeyFormat(format!("bad P-256 SPKI: {}", e)))?;
        }
        EccCurve::P384 => {
            p384::PublicKey::from_public_key_der(der)
                .map_err(|e| Error::InvalidKeyFormat(format!("bad P-384 SPKI: {}", e)))?;
        }
    }
    Ok(())
}

fn affine_coordinates(curve: EccCurve, der: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    match curve {
        EccCurve::P256 => {
            let key = p256::PublicKey::from_public_key_der(der)
                .map_err(|e| Error::InvalidKeyFormat(format!("bad P-256 SPKI: {}", e)))?;
            let point = key.to_encoded_point(false);
            let x = point
                .x()
                .ok_or_else(|| Error::InvalidKeyFormat("point at infinity".to_string()))?;
            let y = point
                .y()
                .ok_or_else(|| Error::InvalidKeyFormat("point at infinity".to_string()))?;
            Ok((x.to_vec(), y.to_vec()))
        }
        EccCurve::P384 => {
            let key = p384::PublicKey::from_public_key_der(der)
                .map_err(|e| Error::InvalidKeyFormat(format!("bad P-384 SPKI: {}", e)))?;
            let point = key.to_encoded_point(false);
            let x = point
                .x()
                .ok_or_else(|| Error::InvalidKeyFormat("point at infinity".to_string()))?;
            let y = point
                .y()
                .ok_or_else(|| Error::InvalidKeyFormat("point at infinity".to_string()))?;
            Ok((x.to_vec(), y.to_vec()))
        }
    }
}

fn der_from_coordinates(curve: EccCurve, x: &[u8], y: &[u8]) -> Result<Vec<u8>> {
    match curve {
        EccCurve::P256 => {
            let point = p256::EncodedPoint::from_affine_coordinates(
                GenericArray::from_slice(x),
                GenericArray::from_slice(y),
                false,
            );
            let key: p256::PublicKey = Option::from(p256::PublicKey::from_encoded_point(&point))
                .ok_or_else(|| {
                    Error::InvalidKeyFormat("coordinates are not a P-256 point".to_string())
                })?;
            Ok(key
                .to_public_key_der()
                .map_err(|e| Error::InvalidKeyFormat(format!("SPKI encode: {}", e)))?
                .into_vec())
        }
        EccCurve::P384 => {
            let point = p384::EncodedPoint::from_affine_coordinates(
                GenericArray::from_slice(x),
                GenericArray::from_slice(y),
                false,
            );
            let key: p384::PublicKey = Option::from(p384::PublicKey::from_encoded_point(&point))
                .ok_or_else(|| {
                    Error::InvalidKeyFormat("coordinates are not a P-384 point".to_string())
                })?;
            Ok(key
                .to_public_key_der()
                .map_err(|e| Error::InvalidKeyFormat(format!("SPKI encode: {}", e)))?
                .into_vec())
        }
    }
}

fn raw_ecdh(curve: EccCurve, private_pkcs8: &[u8], remote_spki: &[u8]) -> Result<Vec<u8>> {
    match curve {
        EccCurve::P256 => {
            let secret = p256::SecretKey::from_pkcs8_der(private_pkcs8)
                .map_err(|e| Error::InvalidKeyFormat(format!("bad P-256 PKCS#8: {}", e)))?;
            let remote = p256::PublicKey::from_public_key_der(remote_spki)
                .map_err(|e| Error::InvalidKeyFormat(format!("bad P-256 SPKI: {}", e)))?;
            let shared =
                p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), remote.as_affine());
            Ok(shared.raw_secret_bytes().to_vec())
        }
        EccCurve::P384 => {
            let secret = p384::SecretKey::from_pkcs8_der(private_pkcs8)
                .map_err(|e| Error::InvalidKeyFormat(format!("bad P-384 PKCS#8: {}", e)))?;
            let remote = p384::PublicKey::from_public_key_der(remote_spki)
                .map_err(|e| Error::InvalidKeyFormat(format!("bad P-384 SPKI: {}", e)))?;
            let shared =
                p384::ecdh::diffie_hellman(secret.to_nonzero_scalar(), remote.as_affine());
            Ok(shared.raw_secret_bytes().to_vec())
        }
    }
}

fn decode_coordinate(encoded: &str, width: usize) -> Result<Vec<u8>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| Error::InvalidKeyFormat(format!("bad base64url coordinate: {}", e)))?;
    if bytes.len() > width {
        return Err(Error::InvalidKeyFormat(format!(
            "coordinate is {} bytes, curve width is {}",
            bytes.len(),
            width
        )));
    }
    // Left-pad: big-endian integers with stripped leading zeros.
    let mut padded = vec![0u8; width - bytes.len()];
    padded.extend_from_slice(&bytes);
    Ok(padded)
}

/// Serde helper for serializing byte vectors as standard base64
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

// Re-exported for sibling modules that persist raw byte fields.
pub(crate) use base64_bytes as serde_base64;

/// Decode a standard-base64 string into bytes.
pub fn base64_decode(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| Error::DeserializationError(format!("bad base64: {}", e)))
}

/// Encode bytes as a standard-base64 string.
pub fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MILLIS_PER_HOUR;

    const PASSPHRASE: [u8; 16] = [0x42; 16];

    #[test]
    fn test_generate_both_curves() {
        for curve in [EccCurve::P256, EccCurve::P384] {
            let pair = EccKeyPair::generate(&PASSPHRASE, curve, MILLIS_PER_HOUR).unwrap();
            assert_eq!(pair.public.curve, curve);
            assert!(pair.public.verify_crc());
            assert!(!pair.public.is_expired());
            assert_eq!(
                pair.public.expiration,
                pair.private.created_at + MILLIS_PER_HOUR
            );
        }
    }

    #[test]
    fn test_generate_rejects_bad_arguments() {
        assert!(matches!(
            EccKeyPair::generate(&[0u8; 8], EccCurve::P384, MILLIS_PER_HOUR),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            EccKeyPair::generate(&PASSPHRASE, EccCurve::P384, 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            EccKeyPair::generate(&PASSPHRASE, EccCurve::P384, -5),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_private_key_create_wraps_der() {
        let raw = p256::SecretKey::random(&mut OsRng)
            .to_pkcs8_der()
            .unwrap()
            .as_bytes()
            .to_vec();

        let private = EccPrivateKey::create(&PASSPHRASE, &raw).unwrap();
        assert_eq!(private.iv.len(), 16);
        assert_eq!(private.key_hash, reduce_sha256(&PASSPHRASE));

        let der = cbc::decrypt(&private.encrypted_key, &PASSPHRASE, &private.iv).unwrap();
        assert_eq!(der, raw);

        assert!(matches!(
            EccPrivateKey::create(&[0u8; 8], &raw),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unwrap_with_wrong_passphrase() {
        let pair = EccKeyPair::generate(&PASSPHRASE, EccCurve::P256, MILLIS_PER_HOUR).unwrap();
        let wrong = [0x43u8; 16];
        assert!(matches!(
            pair.unwrap_private_key(&wrong),
            Err(Error::IncorrectKey)
        ));

        // Right passphrase yields parseable PKCS#8
        let der = pair.unwrap_private_key(&PASSPHRASE).unwrap();
        assert!(p256::SecretKey::from_pkcs8_der(der.as_bytes()).is_ok());
    }

    #[test]
    fn test_unwrap_caches_and_still_checks_passphrase() {
        let pair = EccKeyPair::generate(&PASSPHRASE, EccCurve::P256, MILLIS_PER_HOUR).unwrap();
        let first = pair.unwrap_private_key(&PASSPHRASE).unwrap();
        let second = pair.unwrap_private_key(&PASSPHRASE).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());

        // The hash check still guards the cached plaintext
        assert!(matches!(
            pair.unwrap_private_key(&[0x43u8; 16]),
            Err(Error::IncorrectKey)
        ));
    }

    #[test]
    fn test_jwk_round_trip() {
        for curve in [EccCurve::P256, EccCurve::P384] {
            let pair = EccKeyPair::generate(&PASSPHRASE, curve, MILLIS_PER_HOUR).unwrap();
            let jwk = pair.public.to_jwk().unwrap();
            assert_eq!(jwk.kty, "EC");
            assert_eq!(jwk.crv, curve.jwk_name());

            let imported = EccPublicKey::from_jwk(&jwk, pair.public.expiration).unwrap();
            assert_eq!(imported.public_key_der, pair.public.public_key_der);
        }
    }

    #[test]
    fn test_jwk_accepts_stripped_leading_zeros() {
        // Retry until a key whose x coordinate starts with a zero byte
        // would be needed to exercise padding organically; instead strip
        // manually and confirm the import still resolves the same point.
        let pair = EccKeyPair::generate(&PASSPHRASE, EccCurve::P256, MILLIS_PER_HOUR).unwrap();
        let jwk = pair.public.to_jwk().unwrap();

        let x = URL_SAFE_NO_PAD.decode(&jwk.x).unwrap();
        if x[0] == 0 {
            let stripped = Jwk {
                x: URL_SAFE_NO_PAD.encode(&x[1..]),
                ..jwk.clone()
            };
            let imported = EccPublicKey::from_jwk(&stripped, 0).unwrap();
            assert_eq!(imported.public_key_der, pair.public.public_key_der);
        }

        // Round trip through padding always holds
        let imported = EccPublicKey::from_jwk(&jwk, 0).unwrap();
        assert_eq!(imported.public_key_der, pair.public.public_key_der);
    }

    #[test]
    fn test_jwk_rejects_wrong_kty_and_crv() {
        let pair = EccKeyPair::generate(&PASSPHRASE, EccCurve::P256, MILLIS_PER_HOUR).unwrap();
        let jwk = pair.public.to_jwk().unwrap();

        let bad_kty = Jwk {
            kty: "RSA".to_string(),
            ..jwk.clone()
        };
        assert!(matches!(
            EccPublicKey::from_jwk(&bad_kty, 0),
            Err(Error::InvalidKeyFormat(_))
        ));

        let bad_crv = Jwk {
            crv: "P-521".to_string(),
            ..jwk
        };
        assert!(matches!(
            EccPublicKey::from_jwk(&bad_crv, 0),
            Err(Error::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn test_jwk_base64url_round_trip() {
        let pair = EccKeyPair::generate(&PASSPHRASE, EccCurve::P384, MILLIS_PER_HOUR).unwrap();
        let encoded = pair.public.to_jwk_base64url().unwrap();
        let imported = EccPublicKey::from_jwk_base64url(&encoded, pair.public.expiration).unwrap();
        assert_eq!(imported.public_key_der, pair.public.public_key_der);
    }

    #[test]
    fn test_ecdh_symmetry() {
        for curve in [EccCurve::P256, EccCurve::P384] {
            let other_pass = [0x99u8; 16];
            let alice = EccKeyPair::generate(&PASSPHRASE, curve, MILLIS_PER_HOUR).unwrap();
            let bob = EccKeyPair::generate(&other_pass, curve, MILLIS_PER_HOUR).unwrap();
            let salt = [0x07u8; 16];

            let alice_secret = alice.ecdh(&PASSPHRASE, &bob.public, &salt).unwrap();
            let bob_secret = bob.ecdh(&other_pass, &alice.public, &salt).unwrap();

            assert_eq!(alice_secret.len(), EXCHANGED_SECRET_LEN);
            assert_eq!(alice_secret.as_bytes(), bob_secret.as_bytes());
        }
    }

    #[test]
    fn test_ecdh_rejects_short_salt_and_curve_mismatch() {
        let alice = EccKeyPair::generate(&PASSPHRASE, EccCurve::P256, MILLIS_PER_HOUR).unwrap();
        let bob = EccKeyPair::generate(&PASSPHRASE, EccCurve::P256, MILLIS_PER_HOUR).unwrap();

        assert!(matches!(
            alice.ecdh(&PASSPHRASE, &bob.public, &[0u8; 15]),
            Err(Error::InvalidArgument(_))
        ));

        let carol = EccKeyPair::generate(&PASSPHRASE, EccCurve::P384, MILLIS_PER_HOUR).unwrap();
        assert!(matches!(
            alice.ecdh(&PASSPHRASE, &carol.public, &[0u8; 16]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let pair = EccKeyPair::generate(&PASSPHRASE, EccCurve::P384, MILLIS_PER_HOUR).unwrap();
        let json = serde_json::to_string(&pair).unwrap();
        let restored: EccKeyPair = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.public, pair.public);
        let der = restored.unwrap_private_key(&PASSPHRASE).unwrap();
        assert!(!der.is_empty());
    }

    #[test]
    fn test_crc_detects_corruption() {
        let pair = EccKeyPair::generate(&PASSPHRASE, EccCurve::P256, MILLIS_PER_HOUR).unwrap();
        let mut tampered = pair.public.clone();
        let last = tampered.public_key_der.len() - 1;
        tampered.public_key_der[last] ^= 0x01;
        assert!(!tampered.verify_crc());
    }
}
