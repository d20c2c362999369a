use crate::config::TrustPolicy;
use crate::error::Result;
use crate::models::{TokenResponse, TOKEN_TYPE_BEARER};
use crate::tokens::issue;
use auth_certificate::Certificate;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Issuer side of the exchange: validate a presented certificate, then sign
/// a token for it.
#[derive(Debug, Clone)]
pub struct CertificateTokenProvider {
    policy: Arc<TrustPolicy>,
}

impl CertificateTokenProvider {
    pub fn new(policy: Arc<TrustPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Arc<TrustPolicy> {
        &self.policy
    }

    /// Exchange a certificate for a bearer token.
    ///
    /// # Errors
    ///
    /// - `OAuthError::Validation` if the certificate is outside its validity
    ///   window or not the pinned certificate
    /// - `OAuthError::Token` if signing fails
    pub fn exchange(&self, cert: &Certificate, now: DateTime<Utc>) -> Result<TokenResponse> {
        self.policy.validate(cert, now)?;
        let issued = issue(cert, &self.policy, now)?;

        Ok(TokenResponse {
            access_token: issued.access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: issued.expires_in,
            client_id: cert.subject.clone(),
        })
    }

    /// [`CertificateTokenProvider::exchange`] on a base64 DER certificate.
    ///
    /// # Errors
    ///
    /// `OAuthError::Certificate` if the value does not decode, otherwise as
    /// [`CertificateTokenProvider::exchange`].
    pub fn exchange_base64(&self, certificate_base64: &str, now: DateTime<Utc>) -> Result<TokenResponse> {
        let cert = Certificate::from_base64_der(certificate_base64)?;
        self.exchange(&cert, now)
    }
}
