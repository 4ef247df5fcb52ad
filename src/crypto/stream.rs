//! Chunk-chained streaming AES-CBC.
//!
//! Large payloads are ciphered chunk by chunk without buffering the
//! whole stream, while staying byte-compatible with a single AES-CBC
//! pass over the concatenated data:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       STREAMING CBC CHAINING                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  encrypt:  chunk N is ciphered with IV = last ciphertext block of      │
//! │            chunk N-1; the padding block each interior chunk produces   │
//! │            is held back and replaced by the next chunk's output, so    │
//! │            only the final chunk's padding survives into the stream     │
//! │                                                                         │
//! │  decrypt:  one-chunk look-ahead; an interior chunk has no padding of   │
//! │            its own, so a synthetic padding block (the encryption of   │
//! │            an empty message under the chunk's trailing block as IV)   │
//! │            is appended before unpadded decryption, then stripped by    │
//! │            PKCS7 removal                                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Interior chunks must be block-aligned; an unaligned chunk is accepted
//! only as the final one, and pushing again after it fails.

use zeroize::Zeroize;

use crate::crypto::cbc::{self, BLOCK_SIZE};
use crate::error::{Error, Result};

fn check_stream_key_iv(key: &[u8], iv: &[u8]) -> Result<()> {
    if key.len() != BLOCK_SIZE {
        return Err(Error::InvalidArgument(format!(
            "AES key must be {} bytes, got {}",
            BLOCK_SIZE,
            key.len()
        )));
    }
    if iv.len() != BLOCK_SIZE {
        return Err(Error::InvalidArgument(format!(
            "IV must be {} bytes, got {}",
            BLOCK_SIZE,
            iv.len()
        )));
    }
    Ok(())
}

/// Incremental AES-128-CBC encryptor.
///
/// Push plaintext chunks in order, then call [`finish`](Self::finish)
/// to flush the final padding block. The concatenated output equals
/// [`cbc::encrypt`] over the concatenated input.
pub struct CbcStreamEncryptor {
    key: Vec<u8>,
    rolling_iv: [u8; BLOCK_SIZE],
    pending: Vec<u8>,
    saw_partial: bool,
}

impl CbcStreamEncryptor {
    /// Start a stream under `key` with the caller's initial IV.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        check_stream_key_iv(key, iv)?;
        let mut rolling_iv = [0u8; BLOCK_SIZE];
        rolling_iv.copy_from_slice(iv);
        Ok(Self {
            key: key.to_vec(),
            rolling_iv,
            pending: Vec::new(),
            saw_partial: false,
        })
    }

    /// Encrypt the next chunk, returning the bytes ready to emit.
    ///
    /// Every chunk except the last must be a multiple of 16 bytes. An
    /// unaligned chunk is treated as final; pushing after one fails.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        if self.saw_partial {
            return Err(Error::InvalidArgument(
                "chunk pushed after a non-block-aligned (final) chunk".to_string(),
            ));
        }
        if chunk.len() % BLOCK_SIZE != 0 {
            self.saw_partial = true;
        }

        let mut ciphertext = cbc::encrypt(chunk, &self.key, &self.rolling_iv)?;
        // The trailing block is this chunk's padding; it only belongs in
        // the stream if no further chunk arrives.
        let split_at = ciphertext.len() - BLOCK_SIZE;
        self.pending = ciphertext.split_off(split_at);

        // Chain the next chunk off the last emitted ciphertext block.
        if ciphertext.len() >= BLOCK_SIZE {
            self.rolling_iv
                .copy_from_slice(&ciphertext[ciphertext.len() - BLOCK_SIZE..]);
        }
        Ok(ciphertext)
    }

    /// Flush the held-back padding block and consume the stream.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.pending.is_empty() {
            // No chunk was ever pushed; an empty message still pads.
            return cbc::encrypt(&[], &self.key, &self.rolling_iv);
        }
        Ok(std::mem::take(&mut self.pending))
    }
}

impl Drop for CbcStreamEncryptor {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Incremental AES-128-CBC decryptor.
///
/// Push ciphertext chunks in order, then call [`finish`](Self::finish).
/// Operates with a one-chunk look-ahead so only the true final chunk
/// undergoes real PKCS7 validation.
pub struct CbcStreamDecryptor {
    key: Vec<u8>,
    rolling_iv: [u8; BLOCK_SIZE],
    buffered: Option<Vec<u8>>,
}

impl CbcStreamDecryptor {
    /// Start a stream under `key` with the IV the encryptor started with.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        check_stream_key_iv(key, iv)?;
        let mut rolling_iv = [0u8; BLOCK_SIZE];
        rolling_iv.copy_from_slice(iv);
        Ok(Self {
            key: key.to_vec(),
            rolling_iv,
            buffered: None,
        })
    }

    /// Feed the next ciphertext chunk, returning any decrypted plaintext.
    ///
    /// The first push returns nothing; each later push decrypts the
    /// previously buffered chunk, which is now known to be interior and
    /// must be a non-empty multiple of 16 bytes.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let previous = match self.buffered.replace(chunk.to_vec()) {
            Some(prev) => prev,
            None => return Ok(Vec::new()),
        };
        self.decrypt_interior(&previous)
    }

    /// Decrypt the buffered final chunk with real padding validation.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        match self.buffered.take() {
            Some(last) => cbc::decrypt(&last, &self.key, &self.rolling_iv),
            None => Ok(Vec::new()),
        }
    }

    fn decrypt_interior(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        if chunk.is_empty() || chunk.len() % BLOCK_SIZE != 0 {
            return Err(Error::InvalidArgument(format!(
                "interior ciphertext chunk length {} is not a positive multiple of {}",
                chunk.len(),
                BLOCK_SIZE
            )));
        }

        // An interior chunk carries no padding. Synthesize the padding
        // block it would have had: ciphering an empty message under the
        // chunk's own trailing block as IV yields exactly one block that
        // PKCS7 removal strips back out after decryption.
        let tail = &chunk[chunk.len() - BLOCK_SIZE..];
        let artificial = cbc::encrypt_padding_block(&self.key, tail)?;

        let mut combined = Vec::with_capacity(chunk.len() + BLOCK_SIZE);
        combined.extend_from_slice(chunk);
        combined.extend_from_slice(&artificial);

        let plaintext = cbc::decrypt(&combined, &self.key, &self.rolling_iv)?;
        self.rolling_iv.copy_from_slice(tail);
        Ok(plaintext)
    }
}

impl Drop for CbcStreamDecryptor {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [0x3C; 16];
    const IV: [u8; 16] = [0x5A; 16];

    fn stream_encrypt(chunks: &[&[u8]]) -> Vec<u8> {
        let mut enc = CbcStreamEncryptor::new(&KEY, &IV).unwrap();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(enc.push_chunk(chunk).unwrap());
        }
        out.extend(enc.finish().unwrap());
        out
    }

    fn stream_decrypt(ciphertext: &[u8], chunk_sizes: &[usize]) -> Vec<u8> {
        let mut dec = CbcStreamDecryptor::new(&KEY, &IV).unwrap();
        let mut out = Vec::new();
        let mut offset = 0;
        for &size in chunk_sizes {
            out.extend(dec.push_chunk(&ciphertext[offset..offset + size]).unwrap());
            offset += size;
        }
        assert_eq!(offset, ciphertext.len());
        out.extend(dec.finish().unwrap());
        out
    }

    #[test]
    fn test_stream_matches_single_pass_encrypt() {
        let part_a = [0xA1u8; 48];
        let part_b = [0xB2u8; 32];
        let part_c = [0xC3u8; 17];

        let mut whole = Vec::new();
        whole.extend_from_slice(&part_a);
        whole.extend_from_slice(&part_b);
        whole.extend_from_slice(&part_c);

        let streamed = stream_encrypt(&[&part_a, &part_b, &part_c]);
        let single = cbc::encrypt(&whole, &KEY, &IV).unwrap();
        assert_eq!(streamed, single);
    }

    #[test]
    fn test_stream_round_trip_across_uneven_boundaries() {
        let plaintext: Vec<u8> = (0..97).map(|i| i as u8).collect();
        let streamed = stream_encrypt(&[&plaintext[..48], &plaintext[48..80], &plaintext[80..]]);

        // Decrypt with chunk boundaries unrelated to the encrypt side.
        assert_eq!(streamed.len(), 112);
        let recovered = stream_decrypt(&streamed, &[16, 64, 32]);
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn test_single_chunk_stream() {
        let plaintext = b"short message";
        let streamed = stream_encrypt(&[plaintext]);
        assert_eq!(streamed, cbc::encrypt(plaintext, &KEY, &IV).unwrap());

        let recovered = stream_decrypt(&streamed, &[streamed.len()]);
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn test_empty_stream() {
        let enc = CbcStreamEncryptor::new(&KEY, &IV).unwrap();
        let streamed = enc.finish().unwrap();
        assert_eq!(streamed, cbc::encrypt(&[], &KEY, &IV).unwrap());

        let mut dec = CbcStreamDecryptor::new(&KEY, &IV).unwrap();
        assert!(dec.push_chunk(&streamed).unwrap().is_empty());
        assert!(dec.finish().unwrap().is_empty());
    }

    #[test]
    fn test_push_after_partial_chunk_fails() {
        let mut enc = CbcStreamEncryptor::new(&KEY, &IV).unwrap();
        enc.push_chunk(&[0u8; 17]).unwrap();
        assert!(matches!(
            enc.push_chunk(&[0u8; 16]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_decrypt_rejects_unaligned_interior_chunk() {
        let mut dec = CbcStreamDecryptor::new(&KEY, &IV).unwrap();
        assert!(dec.push_chunk(&[0u8; 15]).unwrap().is_empty());
        // The 15-byte chunk becomes interior once another chunk arrives.
        assert!(matches!(
            dec.push_chunk(&[0u8; 16]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_constructor_rejects_bad_lengths() {
        assert!(CbcStreamEncryptor::new(&[0u8; 24], &IV).is_err());
        assert!(CbcStreamEncryptor::new(&KEY, &[0u8; 8]).is_err());
        assert!(CbcStreamDecryptor::new(&[0u8; 24], &IV).is_err());
        assert!(CbcStreamDecryptor::new(&KEY, &[0u8; 8]).is_err());
    }

    #[test]
    fn test_tampered_final_chunk_fails_validation() {
        let streamed = stream_encrypt(&[&[0x42u8; 32]]);
        let mut tampered = streamed.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;

        let mut dec = CbcStreamDecryptor::new(&KEY, &IV).unwrap();
        dec.push_chunk(&tampered).unwrap();
        assert!(dec.finish().is_err());
    }
}
