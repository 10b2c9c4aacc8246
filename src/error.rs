//! Error types for the certificate store and the signature engine.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while opening or querying a certificate store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("certificate store not found: {0}")]
    NotFound(PathBuf),

    #[error("store passphrase rejected")]
    BadPassphrase,

    #[error("malformed certificate store: {0}")]
    Malformed(String),

    #[error("unknown alias: {0}")]
    UnknownAlias(String),

    #[error("key passphrase rejected for alias '{0}'")]
    BadKeyPassphrase(String),

    #[error("key for alias '{0}' is not usable with the configured signature algorithm")]
    UnsupportedKeyAlgorithm(String),

    #[error("certificate for alias '{0}' yields no usable public key")]
    NoUsablePublicKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),
}

/// Failures raised by signature engine operations.
///
/// A signature that simply does not validate is NOT an error: `verify`
/// reports that as `Ok(false)`. Only structural violations (wrong candidate
/// length) and precondition violations (no key selected, empty document)
/// raise.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no signing key selected")]
    NoKeySelected,

    #[error("store returned an unusable signing key for alias '{0}'")]
    NullKeyRejected(String),

    #[error("refusing to sign an empty document")]
    EmptyDocument,

    #[error("invalid signature length: expected {expected} bytes, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),
}
