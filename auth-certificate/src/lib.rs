//! Certificate handling for certificate-based token issuance.
//!
//! - [`Certificate`]: parse X.509 certificates from base64 DER, PEM, DER
//!   files, and passphrase-protected identity bundles
//! - [`validate`]: accept or refuse a certificate at a given instant,
//!   optionally pinned to one thumbprint
//! - `generate` (feature `generate`): mint self-signed client identities
//!
//! ```no_run
//! use auth_certificate::{validate, Certificate};
//! use chrono::Utc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cert = Certificate::load("client.pem")?;
//! validate(&cert, Some("50CB563ED29BCED78C4A867F879FAEADA6203997"), Utc::now())?;
//! # Ok(())
//! # }
//! ```

pub mod certificate;
pub mod error;
#[cfg(any(test, feature = "generate"))]
pub mod generate;
pub mod validation;

#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::missing_panics_doc)]
pub mod testutil;

pub use certificate::{thumbprint_of, Certificate};
pub use error::{CertLoadError, GenerateError, Result, ValidationError};
pub use validation::{thumbprints_match, validate};
