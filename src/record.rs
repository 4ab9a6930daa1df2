//! Sealing and opening of individual store records
//!
//! A record is one plaintext chunk encrypted with AES-256-GCM:
//!
//! - nonce: 12 bytes, random, unique per record
//! - ciphertext + 16-byte authentication tag: variable length
//!
//! The nonce prefix has a fixed, known length, so a record needs no length
//! field: everything after the nonce is ciphertext+tag.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};

use crate::error::{CryptfileError, ErrorCategory, ErrorKind, Result};
use crate::kdf::KEY_LEN;

/// Length of the AES-GCM nonce in bytes (the mode's standard 96-bit size)
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Seal one plaintext chunk into a self-contained record.
///
/// A fresh random nonce is drawn from the OS RNG on every call. Nonce reuse
/// under the same key breaks both confidentiality and integrity, so there is
/// deliberately no way to supply one. Empty plaintext is valid and seals to
/// a nonce-plus-tag-only record.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher.encrypt(&nonce, plaintext).map_err(|e| {
        CryptfileError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CipherFailure,
            format!("failed to seal record: {}", e),
        )
    })?;

    let mut record = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    record.extend_from_slice(&nonce);
    record.extend_from_slice(&ciphertext);

    Ok(record)
}

/// Open a record back into plaintext.
///
/// Fails if the record is shorter than the nonce prefix, or if
/// authentication fails for any reason - an incorrect passphrase, bit flips
/// and truncation are indistinguishable here. No partial plaintext is ever
/// returned.
pub fn open(key: &[u8; KEY_LEN], record: &[u8]) -> Result<Vec<u8>> {
    if record.len() < NONCE_LEN {
        return Err(CryptfileError::with_kind(
            ErrorCategory::User,
            ErrorKind::TruncatedRecord,
            "record shorter than nonce; input likely truncated",
        ));
    }

    let (nonce, ciphertext) = record.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            CryptfileError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "corrupt record, tampered-with data, or bad passphrase",
            )
        })?;

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::derive_key;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = derive_key(b"test").unwrap();
        let plaintext = b"hello";

        let record = seal(&key, plaintext).unwrap();
        let opened = open(&key, &record).unwrap();

        assert_eq!(plaintext, &opened[..]);
    }

    #[test]
    fn test_empty_plaintext() {
        let key = derive_key(b"test").unwrap();

        let record = seal(&key, b"").unwrap();
        assert_eq!(record.len(), NONCE_LEN + TAG_LEN);

        let opened = open(&key, &record).unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let key = derive_key(b"test").unwrap();
        let plaintext = b"hello world";

        let record1 = seal(&key, plaintext).unwrap();
        let record2 = seal(&key, plaintext).unwrap();

        // Same key and plaintext, but the nonce (and thus the whole record)
        // must differ.
        assert_ne!(record1, record2);
        assert_ne!(record1[..NONCE_LEN], record2[..NONCE_LEN]);

        assert_eq!(open(&key, &record1).unwrap(), plaintext);
        assert_eq!(open(&key, &record2).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_key() {
        let key = derive_key(b"correct").unwrap();
        let wrong = derive_key(b"wrong").unwrap();

        let record = seal(&key, b"secret data").unwrap();
        let err = open(&wrong, &record).expect_err("expected authentication failure");

        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_shorter_than_nonce() {
        let key = derive_key(b"test").unwrap();

        for len in 0..NONCE_LEN {
            let record = vec![0u8; len];
            let err = open(&key, &record).expect_err("expected truncated record error");
            assert_eq!(err.kind, Some(ErrorKind::TruncatedRecord));
        }
    }

    #[test]
    fn test_missing_tag() {
        let key = derive_key(b"test").unwrap();

        // Nonce-length prefix present but ciphertext shorter than a tag.
        let record = vec![0u8; NONCE_LEN + 5];
        let err = open(&key, &record).expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_any_bit_flip_detected() {
        let key = derive_key(b"test").unwrap();
        let record = seal(&key, b"payload").unwrap();

        for i in 0..record.len() {
            let mut tampered = record.clone();
            tampered[i] ^= 0x01;
            let err = open(&key, &tampered).expect_err("expected authentication failure");
            assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        }
    }

    #[test]
    fn test_truncated_ciphertext() {
        let key = derive_key(b"test").unwrap();
        let record = seal(&key, b"some longer payload").unwrap();

        let err = open(&key, &record[..record.len() - 1]).expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_all_byte_values() {
        let key = derive_key(b"test").unwrap();
        let plaintext: Vec<u8> = (0..=255).collect();

        let record = seal(&key, &plaintext).unwrap();
        let opened = open(&key, &record).unwrap();

        assert_eq!(plaintext, opened);
    }
}
