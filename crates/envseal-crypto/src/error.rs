//! Crypto error types.

use std::path::PathBuf;

/// Errors from building, verifying, or recording envelopes.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key material: {0}")]
    KeyMaterial(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Envelope field <{0}> is missing")]
    MissingField(&'static str),

    #[error("Envelope field <{field}> is malformed: {reason}")]
    MalformedField { field: &'static str, reason: String },

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedDigest(String),

    #[error("Signature verification failed: envelope was not signed by the expected sender")]
    SignatureInvalid,

    #[error("Digest mismatch: payload was modified or substituted")]
    DigestMismatch,

    #[error("Invalid ledger entry: {0}")]
    InvalidLedgerEntry(String),

    #[error("Ledger store {} is not accessible: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
