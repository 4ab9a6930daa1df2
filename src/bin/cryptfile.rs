//! Cryptfile CLI - passphrase-protected encrypted line store
//!
//! Command-line interface for appending records to an encrypted store and
//! reading the store back, using scrypt key derivation and AES-256-GCM.

use clap::{Parser, Subcommand};
use std::error::Error as StdError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use cryptfile::error::{CryptfileError, ErrorCategory, ErrorKind, Result};
use cryptfile::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};
use cryptfile::store;

#[derive(Parser)]
#[command(name = "cryptfile")]
#[command(version)]
#[command(about = "Passphrase-protected encrypted line store.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append the contents of a file to the store as one encrypted record
    #[command(alias = "a")]
    Append {
        /// Path to the file whose contents is to be appended
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the encrypted store file (created if absent)
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Decrypt the whole store and write out the recovered plaintext
    #[command(alias = "r")]
    Read {
        /// Path to the encrypted store file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the recovered plaintext to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Append { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            append_command(&input, &output, &mut *reader)
        }
        Commands::Read { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            read_command(&input, &output, &mut *reader)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}

fn append_command(
    input: &Path,
    store_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let contents = fs::read(input).map_err(|e| read_error(input, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    store::write(store_path, &passphrase, &contents)
        .map_err(|e| e.with_context(format!("failed to append to {}", store_path.display())))
}

fn read_command(
    store_path: &Path,
    output: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let passphrase = passphrase_reader.read_passphrase()?;
    let plaintext = store::read(store_path, &passphrase)?;
    write_file_secure(output, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output.display())))
}

/// Write recovered plaintext with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                CryptfileError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Io,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents).map_err(|e| {
            CryptfileError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            CryptfileError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

fn read_error(path: &Path, err: io::Error) -> CryptfileError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    CryptfileError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
