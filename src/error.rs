use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to the user.
    ///
    /// Use of Internal is never a guarantee the error is not ultimately
    /// caused by user input - merely that the code cannot confidently
    /// determine that.
    Internal,

    /// The user provided invalid input or asked for something impossible
    /// (e.g. reading a store that does not exist).
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A stored record is shorter than the nonce prefix.
    TruncatedRecord,
    /// A record failed to open. Covers an incorrect passphrase as well as
    /// tampering or corruption; the two are indistinguishable.
    AuthenticationFailed,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// scrypt key derivation failed (misconfigured parameters).
    KdfFailure,
    /// AES-GCM failed to seal a record.
    CipherFailure,
    /// Interaction with the filesystem or stdin/stdout failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct CryptfileError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl CryptfileError {
    /// Creates a new error tagged with a category and kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CryptfileError>;
