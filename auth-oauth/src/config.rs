use crate::error::ConfigError;
use auth_certificate::{thumbprints_match, validate, Certificate, ValidationError};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::RsaPublicKey;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_ISSUER: &str = "OAuthApi";
pub const DEFAULT_AUDIENCE: &str = "OAuthClient";
pub const DEFAULT_EXPIRATION_MINUTES: u32 = 60;
/// HS256 keys shorter than 256 bits are refused.
pub const MIN_SECRET_BYTES: usize = 32;

/// `Authentication` section of the issuer configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthenticationSettings {
    #[serde(default)]
    pub jwt: JwtSettings,

    /// Trust pinning for client certificates
    #[serde(default)]
    pub certificate: CertificateTrustSettings,

    /// Certificate identity used for RS256 signing instead of a shared secret
    #[serde(default)]
    pub signing_certificate: Option<SigningCertificateSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Shared secret for HS256 signing
    #[serde(default)]
    pub secret_key: Option<SecretString>,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_audience")]
    pub audience: String,

    /// Raw configured lifetime; parsed leniently by [`parse_expiration_minutes`]
    #[serde(default)]
    pub expiration_minutes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CertificateTrustSettings {
    /// Expected client certificate thumbprint. Empty or absent accepts any
    /// time-valid certificate.
    #[serde(default)]
    pub thumbprint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigningCertificateSettings {
    /// PEM bundle holding the signing certificate and its private key
    pub path: PathBuf,

    #[serde(default)]
    pub password: Option<SecretString>,
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_audience() -> String {
    DEFAULT_AUDIENCE.to_string()
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret_key: None,
            issuer: default_issuer(),
            audience: default_audience(),
            expiration_minutes: None,
        }
    }
}

/// Parse a configured token lifetime in minutes.
///
/// Absent values use the default silently; unparsable or non-positive values
/// use the default with a warning.
pub fn parse_expiration_minutes(raw: Option<&str>) -> u32 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_EXPIRATION_MINUTES;
    };

    match raw.parse::<u32>() {
        Ok(minutes) if minutes > 0 => minutes,
        _ => {
            tracing::warn!(
                configured = %raw,
                fallback = DEFAULT_EXPIRATION_MINUTES,
                "Invalid token expiration configured, using default"
            );
            DEFAULT_EXPIRATION_MINUTES
        }
    }
}

/// Key used to sign issued tokens.
#[derive(Clone)]
pub enum SigningKey {
    /// Shared secret, HS256
    Hmac(SecretString),
    /// Certificate with RSA private key, RS256
    Certificate(Certificate),
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningKey::Hmac(_) => f.write_str("Hmac([REDACTED])"),
            SigningKey::Certificate(cert) => f
                .debug_tuple("Certificate")
                .field(&cert.thumbprint)
                .finish(),
        }
    }
}

/// Precomputed jsonwebtoken keys for a [`SigningKey`]
#[derive(Clone)]
struct KeyMaterial {
    algorithm: Algorithm,
    key_id: Option<String>,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyMaterial {
    fn from_signing_key(signing_key: &SigningKey) -> Result<Self, ConfigError> {
        match signing_key {
            SigningKey::Hmac(secret) => {
                let secret = secret.expose_secret().as_bytes();
                if secret.len() < MIN_SECRET_BYTES {
                    return Err(ConfigError::WeakSecret {
                        min: MIN_SECRET_BYTES,
                        actual: secret.len(),
                    });
                }
                Ok(Self {
                    algorithm: Algorithm::HS256,
                    key_id: None,
                    encoding: EncodingKey::from_secret(secret),
                    decoding: DecodingKey::from_secret(secret),
                })
            }
            SigningKey::Certificate(cert) => {
                let private_key = cert.private_key().ok_or(ConfigError::SigningKeyUnavailable)?;
                let private_der = private_key
                    .to_pkcs1_der()
                    .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;
                let public_der = RsaPublicKey::from(private_key)
                    .to_pkcs1_der()
                    .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;
                Ok(Self {
                    algorithm: Algorithm::RS256,
                    key_id: Some(cert.thumbprint.clone()),
                    encoding: EncodingKey::from_rsa_der(private_der.as_bytes()),
                    decoding: DecodingKey::from_rsa_der(public_der.as_bytes()),
                })
            }
        }
    }
}

/// Trust and signing rules shared by the issuer and the resource guard.
///
/// Built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct TrustPolicy {
    expected_thumbprint: Option<String>,
    signing_key: SigningKey,
    issuer: String,
    audience: String,
    expiration_minutes: u32,
    keys: KeyMaterial,
}

impl TrustPolicy {
    /// Policy with default issuer, audience and lifetime, and no thumbprint pin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::WeakSecret` for a short HMAC secret, or
    /// `ConfigError::SigningKeyUnavailable` for a certificate without a
    /// private key.
    pub fn new(signing_key: SigningKey) -> Result<Self, ConfigError> {
        let keys = KeyMaterial::from_signing_key(&signing_key)?;
        Ok(Self {
            expected_thumbprint: None,
            signing_key,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            keys,
        })
    }

    /// Build the policy from the `Authentication` configuration section.
    ///
    /// # Errors
    ///
    /// - `ConflictingSigningKeys` if both a secret and a signing certificate are set
    /// - `MissingSigningKey` if neither is set
    /// - `SigningCertificate` if the signing identity cannot be loaded
    pub fn from_settings(settings: &AuthenticationSettings) -> Result<Self, ConfigError> {
        let secret = settings
            .jwt
            .secret_key
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty());

        let signing_key = match (secret, &settings.signing_certificate) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingSigningKeys),
            (None, None) => return Err(ConfigError::MissingSigningKey),
            (Some(secret), None) => SigningKey::Hmac(secret.clone()),
            (None, Some(signing)) => {
                let passphrase = signing.password.as_ref().map(|p| p.expose_secret().as_str());
                SigningKey::Certificate(Certificate::load_identity(&signing.path, passphrase)?)
            }
        };

        let thumbprint = settings
            .certificate
            .thumbprint
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let mut policy = Self::new(signing_key)?
            .with_issuer(&settings.jwt.issuer)
            .with_audience(&settings.jwt.audience)
            .with_expiration_minutes(parse_expiration_minutes(
                settings.jwt.expiration_minutes.as_deref(),
            ));
        if let Some(thumbprint) = thumbprint {
            policy = policy.with_expected_thumbprint(thumbprint);
        } else {
            tracing::warn!(
                "No client certificate thumbprint configured; any time-valid certificate will be accepted"
            );
        }

        tracing::info!(
            algorithm = ?policy.algorithm(),
            issuer = %policy.issuer,
            audience = %policy.audience,
            expiration_minutes = policy.expiration_minutes,
            pinned = policy.expected_thumbprint.is_some(),
            "Trust policy configured"
        );
        Ok(policy)
    }

    #[must_use]
    pub fn with_expected_thumbprint(mut self, thumbprint: impl Into<String>) -> Self {
        self.expected_thumbprint = Some(thumbprint.into());
        self
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    #[must_use]
    pub fn with_expiration_minutes(mut self, minutes: u32) -> Self {
        self.expiration_minutes = minutes;
        self
    }

    /// Validate a presented client certificate against this policy.
    ///
    /// # Errors
    ///
    /// See [`auth_certificate::validate`].
    pub fn validate(&self, cert: &Certificate, now: DateTime<Utc>) -> Result<(), ValidationError> {
        validate(cert, self.expected_thumbprint.as_deref(), now)
    }

    /// True when `thumbprint` is the pinned client thumbprint, or when
    /// nothing is pinned.
    pub fn trusts_thumbprint(&self, thumbprint: &str) -> bool {
        self.expected_thumbprint
            .as_deref()
            .map_or(true, |expected| thumbprints_match(expected, thumbprint))
    }

    pub fn expected_thumbprint(&self) -> Option<&str> {
        self.expected_thumbprint.as_deref()
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn expiration_minutes(&self) -> u32 {
        self.expiration_minutes
    }

    /// Token lifetime in seconds
    pub fn expires_in(&self) -> i64 {
        i64::from(self.expiration_minutes) * 60
    }

    pub fn algorithm(&self) -> Algorithm {
        self.keys.algorithm
    }

    /// `kid` header value; the signing certificate thumbprint in RS256 mode
    pub fn key_id(&self) -> Option<&str> {
        self.keys.key_id.as_deref()
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.keys.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.keys.decoding
    }
}

impl fmt::Debug for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustPolicy")
            .field("expected_thumbprint", &self.expected_thumbprint)
            .field("signing_key", &self.signing_key)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_minutes", &self.expiration_minutes)
            .finish_non_exhaustive()
    }
}
