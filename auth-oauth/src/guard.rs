use crate::config::TrustPolicy;
use crate::error::GuardError;
use crate::tokens::TokenClaims;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Validation};
use std::sync::Arc;

/// Identity of a caller whose bearer token passed the guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedClient {
    pub subject: String,
    pub thumbprint: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedClient {
    fn from_claims(claims: TokenClaims) -> Self {
        Self {
            expires_at: claims.expires_at().unwrap_or(DateTime::<Utc>::MAX_UTC),
            subject: claims.sub,
            thumbprint: claims.thumbprint,
            token_id: claims.jti,
        }
    }
}

/// Bearer token check in front of protected resources.
///
/// Verifies with the same key and algorithm the issuer signs with; a token
/// signed under any other algorithm is refused.
#[derive(Clone)]
pub struct ResourceGuard {
    policy: Arc<TrustPolicy>,
    validation: Validation,
}

impl ResourceGuard {
    pub fn from_policy(policy: Arc<TrustPolicy>) -> Self {
        let mut validation = Validation::new(policy.algorithm());
        // Expiry is checked against the caller-supplied clock below.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[policy.issuer()]);
        validation.set_audience(&[policy.audience()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self { policy, validation }
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Admit or refuse `token` at `now`.
    ///
    /// # Errors
    ///
    /// Returns the [`GuardError`] describing the first failed check.
    pub fn authorize(&self, token: &str, now: DateTime<Utc>) -> Result<AuthenticatedClient, GuardError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GuardError::MissingToken);
        }

        let data = decode::<TokenClaims>(token, self.policy.decoding_key(), &self.validation)
            .map_err(|e| {
                let err = map_jwt_error(e.kind());
                tracing::warn!(reason = %err, detail = %e, "Bearer token rejected");
                err
            })?;

        if data.claims.is_expired_at(now) {
            tracing::warn!(subject = %data.claims.sub, exp = data.claims.exp, "Bearer token expired");
            return Err(GuardError::Expired);
        }

        tracing::debug!(subject = %data.claims.sub, jti = %data.claims.jti, "Bearer token accepted");
        Ok(AuthenticatedClient::from_claims(data.claims))
    }

    /// [`ResourceGuard::authorize`] on a raw `Authorization` header value.
    ///
    /// # Errors
    ///
    /// `MissingToken` if the header is absent or not a bearer credential,
    /// otherwise as [`ResourceGuard::authorize`].
    pub fn authorize_header(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedClient, GuardError> {
        let token = extract_bearer(authorization).ok_or(GuardError::MissingToken)?;
        self.authorize(token, now)
    }
}

/// Token part of a `Bearer <token>` header value. The scheme is matched
/// case-insensitively.
pub fn extract_bearer(authorization: Option<&str>) -> Option<&str> {
    let value = authorization?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn map_jwt_error(kind: &ErrorKind) -> GuardError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => GuardError::InvalidSignature,
        ErrorKind::InvalidIssuer => GuardError::InvalidIssuer,
        ErrorKind::InvalidAudience => GuardError::InvalidAudience,
        ErrorKind::ExpiredSignature => GuardError::Expired,
        _ => GuardError::MalformedToken,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::SigningKey;
    use crate::tokens::issue;
    use auth_certificate::testutil;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use secrecy::SecretString;

    const SECRET: &str = "a-demo-secret-that-is-at-least-32-bytes-long";

    fn hmac_policy() -> TrustPolicy {
        TrustPolicy::new(SigningKey::Hmac(SecretString::new(SECRET.to_string()))).unwrap()
    }

    fn rsa_policy() -> TrustPolicy {
        TrustPolicy::new(SigningKey::Certificate(testutil::signing_identity())).unwrap()
    }

    fn issued_token(policy: &TrustPolicy, now: DateTime<Utc>) -> String {
        let cert = testutil::client_certificate("OAuthDemoClientCert");
        issue(&cert, policy, now).unwrap().access_token
    }

    #[test]
    fn test_hmac_round_trip() {
        let policy = hmac_policy();
        let guard = ResourceGuard::from_policy(Arc::new(policy.clone()));
        let now = Utc::now();

        let client = guard.authorize(&issued_token(&policy, now), now).unwrap();
        assert_eq!(client.subject, "CN=OAuthDemoClientCert");
        assert_eq!(client.expires_at.timestamp(), now.timestamp() + 3600);
    }

    #[test]
    fn test_rsa_round_trip() {
        let policy = rsa_policy();
        let guard = ResourceGuard::from_policy(Arc::new(policy.clone()));
        let now = Utc::now();

        assert!(guard.authorize(&issued_token(&policy, now), now).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        let policy = hmac_policy();
        let guard = ResourceGuard::from_policy(Arc::new(policy.clone()));
        let now = Utc::now();
        let token = issued_token(&policy, now);

        assert!(guard.authorize(&token, now + Duration::seconds(3599)).is_ok());
        assert_eq!(
            guard.authorize(&token, now + Duration::seconds(3600)),
            Err(GuardError::Expired)
        );
    }

    #[test]
    fn test_token_accepted_until_reported_expiry() {
        let policy = hmac_policy();
        let guard = ResourceGuard::from_policy(Arc::new(policy.clone()));
        let cert = testutil::client_certificate("OAuthDemoClientCert");
        let now = DateTime::<Utc>::from_timestamp(1_792_324_800, 900_000_000).unwrap();

        let issued = issue(&cert, &policy, now).unwrap();

        let just_before = issued.expires_at - Duration::milliseconds(100);
        assert!(guard.authorize(&issued.access_token, just_before).is_ok());
        assert_eq!(
            guard.authorize(&issued.access_token, issued.expires_at),
            Err(GuardError::Expired)
        );
    }

    #[test]
    fn test_wrong_issuer_and_audience() {
        let policy = hmac_policy();
        let guard = ResourceGuard::from_policy(Arc::new(policy.clone()));
        let now = Utc::now();

        let token = issued_token(&policy.clone().with_issuer("SomeoneElse"), now);
        assert_eq!(guard.authorize(&token, now), Err(GuardError::InvalidIssuer));

        let token = issued_token(&policy.with_audience("OtherClient"), now);
        assert_eq!(guard.authorize(&token, now), Err(GuardError::InvalidAudience));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let now = Utc::now();
        let guard = ResourceGuard::from_policy(Arc::new(hmac_policy()));

        let other = TrustPolicy::new(SigningKey::Hmac(SecretString::new(
            "a-completely-different-secret-of-32-bytes".to_string(),
        )))
        .unwrap();
        let token = issued_token(&other, now);

        assert_eq!(guard.authorize(&token, now), Err(GuardError::InvalidSignature));
    }

    #[test]
    fn test_algorithm_substitution_rejected() {
        let now = Utc::now();
        let guard = ResourceGuard::from_policy(Arc::new(rsa_policy()));

        // HS256 token keyed with something an attacker could know
        let cert = testutil::client_certificate("attacker");
        let claims = TokenClaims::for_certificate(&cert, &rsa_policy(), now);
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&testutil::signing_identity().public_key),
        )
        .unwrap();

        assert_eq!(guard.authorize(&token, now), Err(GuardError::InvalidSignature));
    }

    #[test]
    fn test_missing_and_malformed() {
        let guard = ResourceGuard::from_policy(Arc::new(hmac_policy()));
        let now = Utc::now();

        assert_eq!(guard.authorize("", now), Err(GuardError::MissingToken));
        assert_eq!(guard.authorize("not.a.jwt", now), Err(GuardError::MalformedToken));
        assert_eq!(guard.authorize("garbage", now), Err(GuardError::MalformedToken));
        assert_eq!(guard.authorize_header(None, now), Err(GuardError::MissingToken));
        assert_eq!(
            guard.authorize_header(Some("Basic dXNlcjpwYXNz"), now),
            Err(GuardError::MissingToken)
        );
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer(Some("bearer abc")), Some("abc"));
        assert_eq!(extract_bearer(Some("Bearer ")), None);
        assert_eq!(extract_bearer(Some("Token abc")), None);
        assert_eq!(extract_bearer(None), None);
    }
}
