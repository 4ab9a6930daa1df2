//! Passphrase-based key derivation
//!
//! Derives the 32-byte AES-256 key from a passphrase using scrypt. The
//! scrypt salt is the MD5 digest of the passphrase itself, which keeps the
//! store format free of any persisted key-derivation metadata. Changing the
//! salt pipeline would make existing stores undecryptable; see DESIGN.md.

use md5::{Digest, Md5};
use scrypt::{Params, scrypt};
use zeroize::Zeroizing;

use crate::error::{CryptfileError, ErrorCategory, ErrorKind, Result};

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// scrypt log2(N) parameter (N = 32768, CPU/memory cost)
const SCRYPT_LOG_N: u8 = 15;

/// scrypt r parameter (block size)
const SCRYPT_R: u32 = 8;

/// scrypt p parameter (parallelization)
const SCRYPT_P: u32 = 1;

/// Derive a 32-byte key from a passphrase.
///
/// Deterministic: the same passphrase always derives the same key. The key
/// is wrapped in `Zeroizing` so it is wiped from memory when dropped.
pub fn derive_key(passphrase: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let salt = Md5::digest(passphrase);

    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN).map_err(|e| {
        CryptfileError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::KdfFailure,
            "failed to create scrypt params",
            e,
        )
    })?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt(passphrase, &salt, &params, &mut *key).map_err(|e| {
        CryptfileError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::KdfFailure,
            "scrypt key derivation failed",
            e,
        )
    })?;

    Ok(key)
}
