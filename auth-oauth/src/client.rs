//! HTTP client for the certificate-to-token exchange
//!
//! Submits the client certificate to the issuer's token endpoint, caches the
//! resulting bearer token, and calls public or protected resources.

use crate::cache::{AccessToken, TokenCache};
use crate::error::AcquisitionError;
use crate::models::{TokenRequest, TokenResponse};
use auth_certificate::Certificate;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const TOKEN_PATH: &str = "/Auth/token";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    /// Issuer base URL, e.g. `https://localhost:7001`
    pub base_url: String,
    pub timeout: Duration,
    /// Accept self-signed issuer certificates (development only)
    pub accept_invalid_certs: bool,
}

impl OAuthClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            accept_invalid_certs: false,
        }
    }
}

/// Client side of the exchange, bound to one default identity.
#[derive(Debug)]
pub struct OAuthClient {
    http: reqwest::Client,
    base_url: String,
    cache: TokenCache<Certificate>,
}

impl OAuthClient {
    /// # Errors
    ///
    /// Returns `AcquisitionError::Network` if the HTTP client cannot be built.
    pub fn new(config: OAuthClientConfig, identity: Certificate) -> Result<Self, AcquisitionError> {
        if config.accept_invalid_certs {
            tracing::warn!("Issuer TLS certificate validation disabled");
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| AcquisitionError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: TokenCache::new(identity),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The certificate used when no override identity is given
    pub fn identity(&self) -> &Certificate {
        self.cache.default_identity()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Exchange `identity` for a token at the issuer. Never touches the cache.
    ///
    /// # Errors
    ///
    /// - `Status` for a non-2xx answer, with the response body
    /// - `Timeout` when the configured timeout elapses
    /// - `Network` for transport failures
    /// - `InvalidResponse` when the body is not a token response
    pub async fn request_token(&self, identity: &Certificate) -> Result<TokenResponse, AcquisitionError> {
        let url = self.url(TOKEN_PATH);
        tracing::debug!(url = %url, subject = %identity.subject, "Requesting access token");

        let response = self
            .http
            .post(&url)
            .json(&TokenRequest::new(identity.to_base64_der()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                subject = %identity.subject,
                body = %body,
                "Token request rejected"
            );
            return Err(AcquisitionError::Status { status, body });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AcquisitionError::InvalidResponse(e.to_string()))?;

        if token.access_token.is_empty() {
            return Err(AcquisitionError::InvalidResponse("empty access_token".to_string()));
        }
        Ok(token)
    }

    /// A usable access token, from the cache when possible.
    ///
    /// With `override_identity`, a token for that certificate is requested
    /// directly and the cache is neither read nor written.
    ///
    /// # Errors
    ///
    /// See [`OAuthClient::request_token`].
    pub async fn access_token(
        &self,
        override_identity: Option<&Certificate>,
    ) -> Result<AccessToken, AcquisitionError> {
        self.cache
            .get_token(Utc::now(), override_identity, |identity| self.request_token(identity))
            .await
    }

    /// Forget the cached token, e.g. after a protected resource rejected it.
    pub async fn invalidate_token(&self) {
        self.cache.invalidate().await;
    }

    /// `GET` an unprotected resource.
    ///
    /// # Errors
    ///
    /// Same categories as [`OAuthClient::request_token`].
    pub async fn get_public<T: DeserializeOwned>(&self, path: &str) -> Result<T, AcquisitionError> {
        let response = self.http.get(self.url(path)).send().await?;
        read_json(response).await
    }

    /// `GET` a protected resource with `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// Same categories as [`OAuthClient::request_token`]; a rejected token is
    /// `Status` with 401.
    pub async fn get_secured<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, AcquisitionError> {
        tracing::debug!(path = %path, token = %telemetry::redact_token(token), "Calling protected resource");
        let response = self
            .http
            .get(self.url(path))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AcquisitionError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AcquisitionError::Status { status, body });
    }
    response
        .json()
        .await
        .map_err(|e| AcquisitionError::InvalidResponse(e.to_string()))
}
