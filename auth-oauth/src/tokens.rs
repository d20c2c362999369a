//! Access token issuance
//!
//! Turns a validated client certificate into a signed JWT under the active
//! [`TrustPolicy`]. HS256 with the shared secret, or RS256 with the signing
//! certificate's private key (`kid` = signing certificate thumbprint).

use crate::config::TrustPolicy;
use crate::error::TokenError;
use auth_certificate::Certificate;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// JWT TOKEN CLAIMS
// =============================================================================

/// Claims carried by every issued access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (certificate subject DN)
    pub sub: String,

    /// Display name, same value as `sub`
    pub name: String,

    /// JWT ID (fresh per token)
    pub jti: String,

    /// Thumbprint of the certificate the token was issued for
    pub thumbprint: String,

    pub iss: String,

    pub aud: String,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expiration (seconds since epoch)
    pub exp: i64,
}

impl TokenClaims {
    /// Claims for `cert` issued at `now` under `policy`.
    pub fn for_certificate(cert: &Certificate, policy: &TrustPolicy, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            sub: cert.subject.clone(),
            name: cert.subject.clone(),
            jti: Uuid::new_v4().to_string(),
            thumbprint: cert.thumbprint.clone(),
            iss: policy.issuer().to_string(),
            aud: policy.audience().to_string(),
            iat,
            exp: iat + policy.expires_in(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// `exp` as an instant. The token stops being accepted at this second.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }
}

// =============================================================================
// ISSUANCE
// =============================================================================

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWS
    pub access_token: String,
    pub claims: TokenClaims,
    pub expires_at: DateTime<Utc>,
    /// Lifetime in seconds reported to the client
    pub expires_in: i64,
}

/// Sign an access token for a certificate that already passed validation.
///
/// # Errors
///
/// Returns `TokenError::Signing` if the JWT cannot be encoded, or
/// `TokenError::ExpiryOutOfRange` if `exp` is not a representable instant.
pub fn issue(
    cert: &Certificate,
    policy: &TrustPolicy,
    now: DateTime<Utc>,
) -> Result<IssuedToken, TokenError> {
    let claims = TokenClaims::for_certificate(cert, policy, now);
    let expires_at = claims.expires_at().ok_or(TokenError::ExpiryOutOfRange(claims.exp))?;

    let mut header = Header::new(policy.algorithm());
    header.kid = policy.key_id().map(str::to_string);

    let access_token = encode(&header, &claims, policy.encoding_key())?;
    let expires_in = policy.expires_in();

    tracing::info!(
        subject = %claims.sub,
        jti = %claims.jti,
        algorithm = ?policy.algorithm(),
        expires_in,
        "Access token issued"
    );

    Ok(IssuedToken {
        access_token,
        expires_at,
        expires_in,
        claims,
    })
}
