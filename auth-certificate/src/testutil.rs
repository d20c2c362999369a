//! Shared test fixtures for certificate-based authentication.
//!
//! Feature-gated behind `testutil`. Downstream crates enable it from their
//! dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! auth-certificate = { path = "../auth-certificate", features = ["testutil"] }
//! ```
//!
//! Fixture files live in the workspace `testdata/` directory:
//!
//! | file | contents |
//! |------|----------|
//! | `oauth-demo.pem` | `CN=OAuthDemo` certificate + key encrypted with [`SIGNING_IDENTITY_PASSPHRASE`] |
//! | `oauth-demo-plain.pem` | same identity, unencrypted key |
//! | `signing-cert.pem` | `CN=OAuthDemo` certificate only |
//! | `unauthorized.pem` | `CN=Unauthorized` certificate + key encrypted with [`UNAUTHORIZED_IDENTITY_PASSPHRASE`] |
//! | `unauthorized-cert.pem` | `CN=Unauthorized` certificate only |
//! | `client-key.pem` | RSA key used for generated client certificates |
//! | `other-key.pem` | `CN=Unauthorized` key, unencrypted |

use crate::Certificate;
use chrono::{DateTime, Duration, Utc};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use std::path::PathBuf;

pub const SIGNING_IDENTITY_PEM: &str = include_str!("../../testdata/oauth-demo.pem");
pub const SIGNING_IDENTITY_PLAIN_PEM: &str = include_str!("../../testdata/oauth-demo-plain.pem");
pub const SIGNING_CERTIFICATE_PEM: &str = include_str!("../../testdata/signing-cert.pem");
pub const SIGNING_IDENTITY_PASSPHRASE: &str = "OAuthDemo2026!";
/// Thumbprint of the `CN=OAuthDemo` certificate
pub const SIGNING_THUMBPRINT: &str = "50CB563ED29BCED78C4A867F879FAEADA6203997";

pub const UNAUTHORIZED_IDENTITY_PEM: &str = include_str!("../../testdata/unauthorized.pem");
pub const UNAUTHORIZED_IDENTITY_PASSPHRASE: &str = "Unauthorized2026!";

pub const CLIENT_KEY_PEM: &str = include_str!("../../testdata/client-key.pem");

/// Absolute path of a file in the workspace `testdata/` directory.
pub fn testdata_path(name: &str) -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../testdata")).join(name)
}

/// Generates a self-signed certificate for `common_name` with the given
/// validity window, signed by [`CLIENT_KEY_PEM`].
///
/// The result is re-parsed through [`Certificate::from_der`] so it carries
/// exactly what a server would see.
pub fn self_signed(
    common_name: &str,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
) -> Certificate {
    let key_pair = KeyPair::from_pem(CLIENT_KEY_PEM).expect("Failed to load test client key");

    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params.not_before = to_offset(not_before);
    params.not_after = to_offset(not_after);

    let cert = params
        .self_signed(&key_pair)
        .expect("Failed to self-sign test certificate");
    Certificate::from_der(cert.der()).expect("Generated certificate should parse")
}

/// A client certificate valid from yesterday until a year from now.
pub fn client_certificate(common_name: &str) -> Certificate {
    let now = Utc::now();
    self_signed(common_name, now - Duration::days(1), now + Duration::days(365))
}

/// The `CN=OAuthDemo` signing identity, private key included.
pub fn signing_identity() -> Certificate {
    Certificate::from_identity_pem(SIGNING_IDENTITY_PEM, Some(SIGNING_IDENTITY_PASSPHRASE))
        .expect("Signing identity fixture should load")
}

fn to_offset(at: DateTime<Utc>) -> time::OffsetDateTime {
    time::OffsetDateTime::from_unix_timestamp(at.timestamp())
        .expect("Timestamp should be representable")
}
