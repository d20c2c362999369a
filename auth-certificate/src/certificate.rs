//! X.509 certificate loading
//!
//! Produces a [`Certificate`] value from:
//! - a base64-encoded DER blob (what a client submits in a token request)
//! - a PEM or DER file holding a public certificate
//! - a PEM identity bundle (certificate plus private key, optionally
//!   passphrase-protected) for the issuer's signing identity or a local
//!   client identity
//!
//! The thumbprint is the SHA-1 digest of the DER encoding rendered as
//! uppercase hex, the format certificate tooling prints and operators paste
//! into configuration.

use crate::error::{CertLoadError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncryptedPrivateKeyInfo, PrivateKeyInfo};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::Path;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;
use x509_parser::time::ASN1Time;

const PEM_CERTIFICATE: &str = "CERTIFICATE";
const PEM_ENCRYPTED_KEY: &str = "ENCRYPTED PRIVATE KEY";
const PEM_PKCS8_KEY: &str = "PRIVATE KEY";
const PEM_PKCS1_KEY: &str = "RSA PRIVATE KEY";

/// A parsed certificate.
///
/// Immutable after construction. Only certificates loaded through
/// [`Certificate::load_identity`] carry a private key.
#[derive(Clone)]
pub struct Certificate {
    /// Subject distinguished name, e.g. `CN=OAuthDemoClientCert`
    pub subject: String,
    /// Uppercase hex SHA-1 of the DER encoding
    pub thumbprint: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// DER encoding of the certificate
    pub raw_bytes: Vec<u8>,
    /// DER-encoded SubjectPublicKeyInfo
    pub public_key: Vec<u8>,
    private_key: Option<RsaPrivateKey>,
}

impl Certificate {
    /// Parse a DER-encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns `CertLoadError::MalformedEncoding` if the bytes are not a single
    /// well-formed certificate or its validity window is inverted.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rem, cert) = X509Certificate::from_der(der).map_err(|e| {
            CertLoadError::MalformedEncoding(format!("invalid X.509 structure: {}", e))
        })?;
        if !rem.is_empty() {
            return Err(CertLoadError::MalformedEncoding(
                "trailing data after certificate".to_string(),
            ));
        }

        let not_before = asn1_to_utc(cert.validity().not_before)?;
        let not_after = asn1_to_utc(cert.validity().not_after)?;

        Self::from_parts(
            cert.subject().to_string(),
            thumbprint_of(der),
            not_before,
            not_after,
            der.to_vec(),
            cert.public_key().raw.to_vec(),
        )
    }

    /// Decode a base64 DER blob as delivered in a token request body.
    ///
    /// # Errors
    ///
    /// Returns `CertLoadError::MalformedEncoding` for invalid base64 or an
    /// invalid certificate structure.
    pub fn from_base64_der(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(CertLoadError::MalformedEncoding("empty certificate".to_string()));
        }
        let der = STANDARD
            .decode(encoded)
            .map_err(|e| CertLoadError::MalformedEncoding(format!("invalid base64: {}", e)))?;
        Self::from_der(&der)
    }

    /// Parse the first `CERTIFICATE` block of a PEM document.
    ///
    /// # Errors
    ///
    /// Returns `CertLoadError::MalformedEncoding` if there is no certificate
    /// block or it does not parse.
    pub fn from_pem(pem_text: &str) -> Result<Self> {
        let blocks = parse_pem(pem_text)?;
        let block = blocks
            .iter()
            .find(|p| p.tag() == PEM_CERTIFICATE)
            .ok_or_else(|| CertLoadError::MalformedEncoding("no CERTIFICATE block".to_string()))?;
        Self::from_der(block.contents())
    }

    /// Load a public certificate from a PEM or DER file.
    ///
    /// # Errors
    ///
    /// Returns `CertLoadError::FileNotFound` if the path does not exist, or
    /// `CertLoadError::MalformedEncoding` if the content is not a certificate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = read_file(path)?;

        let cert = match std::str::from_utf8(&bytes) {
            Ok(text) if text.trim_start().starts_with("-----BEGIN") => Self::from_pem(text)?,
            _ => Self::from_der(&bytes)?,
        };

        tracing::debug!(
            path = %path.display(),
            subject = %cert.subject,
            thumbprint = %cert.thumbprint,
            "Certificate loaded"
        );
        Ok(cert)
    }

    /// Load a certificate together with its RSA private key from a PEM bundle.
    ///
    /// The bundle holds one `CERTIFICATE` block and one key block, either
    /// `ENCRYPTED PRIVATE KEY` (unlocked with `passphrase`), `PRIVATE KEY`,
    /// or `RSA PRIVATE KEY`.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if the path does not exist
    /// - `BadPassphrase` if the key cannot be decrypted with `passphrase`
    /// - `MissingPrivateKey` if the bundle has no key block
    /// - `KeyMismatch` if the key does not belong to the certificate
    /// - `UnsupportedKey` for non-RSA keys
    /// - `MalformedEncoding` for anything that does not parse
    pub fn load_identity(path: impl AsRef<Path>, passphrase: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = read_file(path)?;
        let text = std::str::from_utf8(&bytes).map_err(|_| {
            CertLoadError::MalformedEncoding("identity bundle is not PEM text".to_string())
        })?;

        let identity = Self::from_identity_pem(text, passphrase)?;

        tracing::info!(
            path = %path.display(),
            subject = %identity.subject,
            thumbprint = %identity.thumbprint,
            "Signing identity loaded"
        );
        Ok(identity)
    }

    /// In-memory variant of [`Certificate::load_identity`].
    ///
    /// # Errors
    ///
    /// Same as [`Certificate::load_identity`], minus the file errors.
    pub fn from_identity_pem(pem_text: &str, passphrase: Option<&str>) -> Result<Self> {
        let blocks = parse_pem(pem_text)?;

        let mut certificate = None;
        let mut private_key = None;
        for block in &blocks {
            match block.tag() {
                PEM_CERTIFICATE if certificate.is_none() => {
                    certificate = Some(Self::from_der(block.contents())?);
                }
                PEM_ENCRYPTED_KEY => {
                    private_key = Some(decrypt_private_key(block.contents(), passphrase)?);
                }
                PEM_PKCS8_KEY => {
                    private_key = Some(decode_pkcs8_key(block.contents())?);
                }
                PEM_PKCS1_KEY => {
                    let key = RsaPrivateKey::from_pkcs1_der(block.contents()).map_err(|e| {
                        CertLoadError::MalformedEncoding(format!("invalid RSA private key: {}", e))
                    })?;
                    private_key = Some(key);
                }
                _ => {}
            }
        }

        let mut certificate = certificate
            .ok_or_else(|| CertLoadError::MalformedEncoding("no CERTIFICATE block".to_string()))?;
        let private_key = private_key.ok_or(CertLoadError::MissingPrivateKey)?;

        let certificate_key = RsaPublicKey::from_public_key_der(&certificate.public_key)
            .map_err(|e| CertLoadError::UnsupportedKey(format!("certificate key is not RSA: {}", e)))?;
        if RsaPublicKey::from(&private_key) != certificate_key {
            return Err(CertLoadError::KeyMismatch);
        }

        certificate.private_key = Some(private_key);
        Ok(certificate)
    }

    /// Build a certificate value from already-extracted fields.
    ///
    /// No parsing happens here; the thumbprint is taken as given. Used by the
    /// parsers above and by callers that fabricate certificates for testing.
    ///
    /// # Errors
    ///
    /// Returns `CertLoadError::MalformedEncoding` if `not_before > not_after`.
    pub fn from_parts(
        subject: String,
        thumbprint: String,
        not_before: DateTime<Utc>,
        not_after: DateTime<Utc>,
        raw_bytes: Vec<u8>,
        public_key: Vec<u8>,
    ) -> Result<Self> {
        if not_before > not_after {
            return Err(CertLoadError::MalformedEncoding(
                "validity window ends before it starts".to_string(),
            ));
        }
        Ok(Self {
            subject,
            thumbprint,
            not_before,
            not_after,
            raw_bytes,
            public_key,
            private_key: None,
        })
    }

    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private_key.as_ref()
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Copy of this certificate without the private key
    #[must_use]
    pub fn public_only(&self) -> Self {
        Self {
            private_key: None,
            ..self.clone()
        }
    }

    /// Base64 of the DER encoding, as submitted to the token endpoint
    pub fn to_base64_der(&self) -> String {
        STANDARD.encode(&self.raw_bytes)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("thumbprint", &self.thumbprint)
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .field("has_private_key", &self.has_private_key())
            .finish_non_exhaustive()
    }
}

/// SHA-1 thumbprint of a DER encoding, uppercase hex
pub fn thumbprint_of(der: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(der))
}

fn asn1_to_utc(time: ASN1Time) -> Result<DateTime<Utc>> {
    let timestamp = time.to_datetime().unix_timestamp();
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .ok_or_else(|| CertLoadError::MalformedEncoding(format!("timestamp out of range: {}", timestamp)))
}

fn parse_pem(pem_text: &str) -> Result<Vec<pem::Pem>> {
    pem::parse_many(pem_text)
        .map_err(|e| CertLoadError::MalformedEncoding(format!("invalid PEM: {}", e)))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => CertLoadError::FileNotFound(path.to_path_buf()),
        _ => CertLoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn decrypt_private_key(der: &[u8], passphrase: Option<&str>) -> Result<RsaPrivateKey> {
    let encrypted = EncryptedPrivateKeyInfo::try_from(der).map_err(|e| {
        CertLoadError::MalformedEncoding(format!("invalid encrypted private key: {}", e))
    })?;
    let passphrase = passphrase.ok_or(CertLoadError::BadPassphrase)?;
    let document = encrypted
        .decrypt(passphrase)
        .map_err(|_| CertLoadError::BadPassphrase)?;

    // A wrong passphrase can still yield valid CBC padding; the decrypted
    // bytes then fail to parse as a key.
    if PrivateKeyInfo::try_from(document.as_bytes()).is_err() {
        return Err(CertLoadError::BadPassphrase);
    }
    decode_pkcs8_key(document.as_bytes())
}

fn decode_pkcs8_key(der: &[u8]) -> Result<RsaPrivateKey> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| CertLoadError::MalformedEncoding(format!("invalid private key: {}", e)))?;
    let algorithm = info.algorithm.oid;
    RsaPrivateKey::from_pkcs8_der(der).map_err(|_| {
        CertLoadError::UnsupportedKey(format!("private key algorithm {} is not RSA", algorithm))
    })
}
