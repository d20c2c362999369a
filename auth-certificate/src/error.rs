use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning bytes or files into a [`Certificate`](crate::Certificate).
#[derive(Error, Debug)]
pub enum CertLoadError {
    /// The bytes do not decode to an X.509 certificate (bad base64, PEM, or DER).
    #[error("Malformed certificate encoding: {0}")]
    MalformedEncoding(String),

    #[error("Certificate file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The private key could not be unwrapped with the supplied passphrase.
    #[error("Private key could not be decrypted with the supplied passphrase")]
    BadPassphrase,

    #[error("Identity bundle does not contain a private key")]
    MissingPrivateKey,

    /// The private key does not belong to the certificate it was bundled with.
    #[error("Private key does not match the certificate public key")]
    KeyMismatch,

    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a structurally valid certificate is refused as proof of identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Certificate not yet valid (valid from {not_before})")]
    NotYetValid { not_before: DateTime<Utc> },

    #[error("Certificate expired (valid until {not_after})")]
    Expired { not_after: DateTime<Utc> },

    #[error("Certificate thumbprint mismatch")]
    ThumbprintMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Short categorical reason, safe to return to an unauthenticated caller.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::NotYetValid { .. } => "Certificate not yet valid",
            ValidationError::Expired { .. } => "Certificate expired",
            ValidationError::ThumbprintMismatch { .. } => "Certificate thumbprint mismatch",
        }
    }
}

/// Failures while minting a new self-signed identity.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Invalid identity parameters: {0}")]
    InvalidParameters(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Certificate signing failed: {0}")]
    Signing(String),

    /// The freshly written bundle did not load back.
    #[error("Generated identity does not load: {0}")]
    Reload(#[from] CertLoadError),
}

pub type Result<T> = std::result::Result<T, CertLoadError>;
