//! Encrypted store read/write operations
//!
//! A store file is an ordered sequence of sealed records, one per line. The
//! writer appends a single record per call; the reader opens every record
//! and reassembles the plaintext. The line framing assumes a record's bytes
//! never contain the newline byte; see DESIGN.md.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::error::{CryptfileError, ErrorCategory, ErrorKind, Result};
use crate::kdf;
use crate::record;

/// Append one encrypted record containing `contents` to the store at `path`.
///
/// The key is derived from the passphrase on every call and wiped when the
/// call returns. The store is created with mode 0o600 on Unix if absent;
/// permissions are re-applied after opening to correct a pre-existing looser
/// mode. The record is written in append mode, so prior records are never
/// overwritten.
pub fn write(path: &Path, passphrase: &[u8], contents: &[u8]) -> Result<()> {
    let key = kdf::derive_key(passphrase)?;
    let mut framed = record::seal(&key, contents)?;
    framed.push(b'\n');

    let mut file = open_append(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file
            .metadata()
            .map_err(|e| internal_io(format!("failed to stat {}", path.display()), e))?
            .permissions();
        perms.set_mode(0o600);
        file.set_permissions(perms).map_err(|e| {
            internal_io(format!("failed to set permissions on {}", path.display()), e)
        })?;
    }

    file.write_all(&framed)
        .map_err(|e| internal_io(format!("failed to append record to {}", path.display()), e))?;
    file.sync_all()
        .map_err(|e| internal_io(format!("failed to sync {}", path.display()), e))?;

    Ok(())
}

/// Decrypt the whole store at `path` and return the reassembled plaintext.
///
/// Each line of the store is opened as one record; the recovered chunks are
/// concatenated in file order, each followed by a newline. The first record
/// that fails to open aborts the read with no partial output. An incorrect
/// passphrase surfaces as the first record's authentication failure. An
/// empty store yields an empty buffer.
pub fn read(path: &Path, passphrase: &[u8]) -> Result<Vec<u8>> {
    let file = fs::File::open(path).map_err(|e| open_read_error(path, e))?;
    let key = kdf::derive_key(passphrase)?;

    let mut plaintext = Vec::new();
    for segment in BufReader::new(file).split(b'\n') {
        let sealed = segment
            .map_err(|e| internal_io(format!("failed to read record from {}", path.display()), e))?;
        let opened = record::open(&key, &sealed)
            .map_err(|e| e.with_context(format!("failed to open record in {}", path.display())))?;
        plaintext.extend_from_slice(&opened);
        plaintext.push(b'\n');
    }

    Ok(plaintext)
}

/// Open the store for appending, creating it with restrictive permissions.
fn open_append(path: &Path) -> Result<fs::File> {
    #[cfg(unix)]
    let opened = {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o600)
            .open(path)
    };

    #[cfg(not(unix))]
    let opened = fs::OpenOptions::new().create(true).append(true).open(path);

    opened.map_err(|e| {
        CryptfileError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to open {}", path.display()),
            e,
        )
    })
}

fn open_read_error(path: &Path, err: io::Error) -> CryptfileError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    CryptfileError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to open {}", path.display()),
        err,
    )
}

fn internal_io(msg: String, err: io::Error) -> CryptfileError {
    CryptfileError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}
