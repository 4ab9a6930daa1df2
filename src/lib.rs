//! Cryptfile - passphrase-protected encrypted line store
//!
//! Persists small line-oriented payloads (e.g. a credential store) to disk
//! under a passphrase. Each write appends one authenticated record (AES-256-GCM,
//! key derived via scrypt); each read opens every record and reassembles the
//! plaintext, failing closed on the first record that does not authenticate.

#![forbid(unsafe_code)]

pub mod error;
pub mod kdf;
pub mod passphrase;
pub mod record;
pub mod store;
