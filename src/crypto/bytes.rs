//! Byte-level helpers shared across the crypto subsystem.
//!
//! Concatenation/splitting for envelope layouts, random generation,
//! big-endian i32 codec for version fields, and a length-constant
//! comparison for key hashes.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

/// Generate `len` cryptographically random bytes from the OS RNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Concatenate two byte slices.
pub fn combine2(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// Concatenate three byte slices.
pub fn combine3(a: &[u8], b: &[u8], c: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len() + c.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out.extend_from_slice(c);
    out
}

/// Split a buffer into two parts of exactly `len_a` and `len_b` bytes.
///
/// Fails if the buffer length is not exactly `len_a + len_b`.
pub fn split2(data: &[u8], len_a: usize, len_b: usize) -> Result<(Vec<u8>, Vec<u8>)> {
    if data.len() != len_a + len_b {
        return Err(Error::InvalidArgument(format!(
            "expected {} bytes to split, got {}",
            len_a + len_b,
            data.len()
        )));
    }
    Ok((data[..len_a].to_vec(), data[len_a..].to_vec()))
}

/// Split a buffer into three parts of exactly the given lengths.
pub fn split3(
    data: &[u8],
    len_a: usize,
    len_b: usize,
    len_c: usize,
) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    if data.len() != len_a + len_b + len_c {
        return Err(Error::InvalidArgument(format!(
            "expected {} bytes to split, got {}",
            len_a + len_b + len_c,
            data.len()
        )));
    }
    Ok((
        data[..len_a].to_vec(),
        data[len_a..len_a + len_b].to_vec(),
        data[len_a + len_b..].to_vec(),
    ))
}

/// Encode an i32 as 4 big-endian bytes (envelope version fields).
pub fn int32_to_bytes(value: i32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Decode a big-endian i32 from exactly 4 bytes.
pub fn bytes_to_int32(bytes: &[u8]) -> Result<i32> {
    let arr: [u8; 4] = bytes
        .try_into()
        .map_err(|_| Error::InvalidArgument(format!("expected 4 bytes, got {}", bytes.len())))?;
    Ok(i32::from_be_bytes(arr))
}

/// Compare two equal-length byte slices in constant time.
///
/// Returns false immediately if the lengths differ; lengths here are
/// public (both sides are 16-byte key hashes).
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Screen a symmetric key for degenerate values.
///
/// Rejects all-zero and all-identical keys. This catches wiped buffers
/// and uninitialized material being used as keys, not weak randomness.
pub fn is_strong_key(key: &[u8]) -> bool {
    if key.is_empty() {
        return false;
    }
    let first = key[0];
    key.iter().any(|&b| b != first)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_length_and_variation() {
        let a = random_bytes(32);
        let b = random_bytes(32);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_combine_and_split_round_trip() {
        let combined = combine3(&[1, 2], &[3, 4, 5], &[6]);
        assert_eq!(combined, vec![1, 2, 3, 4, 5, 6]);

        let (a, b, c) = split3(&combined, 2, 3, 1).unwrap();
        assert_eq!(a, vec![1, 2]);
        assert_eq!(b, vec![3, 4, 5]);
        assert_eq!(c, vec![6]);
    }

    #[test]
    fn test_split_rejects_wrong_total_length() {
        assert!(split2(&[1, 2, 3], 2, 2).is_err());
        assert!(split3(&[1, 2, 3], 1, 1, 2).is_err());
    }

    #[test]
    fn test_int32_round_trip_big_endian() {
        let encoded = int32_to_bytes(1);
        assert_eq!(encoded, [0, 0, 0, 1]);
        assert_eq!(bytes_to_int32(&encoded).unwrap(), 1);

        let encoded = int32_to_bytes(-1);
        assert_eq!(encoded, [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(bytes_to_int32(&encoded).unwrap(), -1);
    }

    #[test]
    fn test_bytes_to_int32_rejects_wrong_length() {
        assert!(bytes_to_int32(&[1, 2, 3]).is_err());
        assert!(bytes_to_int32(&[1, 2, 3, 4, 5]).is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[1, 2], &[1, 2, 3]));
        assert!(constant_time_eq(&[], &[]));
    }

    #[test]
    fn test_is_strong_key() {
        assert!(!is_strong_key(&[0u8; 16]));
        assert!(!is_strong_key(&[0xAA; 16]));
        assert!(!is_strong_key(&[]));
        let mut key = [0x42u8; 16];
        key[7] = 0x43;
        assert!(is_strong_key(&key));
    }
}
