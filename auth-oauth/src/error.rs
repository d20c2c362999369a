use auth_certificate::{CertLoadError, ValidationError};
use reqwest::StatusCode;
use thiserror::Error;

/// Startup failures while turning settings into a [`TrustPolicy`](crate::TrustPolicy).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Both a JWT secret key and a signing certificate are configured; choose one")]
    ConflictingSigningKeys,

    #[error("No signing key configured: set a JWT secret key or a signing certificate")]
    MissingSigningKey,

    #[error("JWT secret key must be at least {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },

    #[error("Signing certificate has no private key")]
    SigningKeyUnavailable,

    #[error("Failed to load signing certificate: {0}")]
    SigningCertificate(#[from] CertLoadError),

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Token expiry out of range: {0}")]
    ExpiryOutOfRange(i64),
}

/// Reasons the resource guard refuses a bearer token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    #[error("Invalid token audience")]
    InvalidAudience,

    #[error("Token expired")]
    Expired,
}

/// Failures talking to the issuer, for token requests and resource calls.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AcquisitionError {
    /// True when the issuer answered and refused the certificate.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AcquisitionError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

impl From<reqwest::Error> for AcquisitionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AcquisitionError::Timeout
        } else if err.is_decode() {
            AcquisitionError::InvalidResponse(err.to_string())
        } else {
            AcquisitionError::Network(err.to_string())
        }
    }
}

/// Everything that can go wrong across the certificate-to-token exchange.
#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("Invalid certificate: {0}")]
    Certificate(#[from] CertLoadError),

    #[error("Certificate rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, OAuthError>;
