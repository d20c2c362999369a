use serde::{Deserialize, Serialize};

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Body of `POST /Auth/token`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Base64 DER of the client certificate
    #[serde(
        rename = "CertificateBase64",
        alias = "certificateBase64",
        alias = "certificate_base64",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_base64: Option<String>,
}

impl TokenRequest {
    pub fn new(certificate_base64: impl Into<String>) -> Self {
        Self {
            certificate_base64: Some(certificate_base64.into()),
        }
    }

    /// The submitted certificate, if any non-blank value was sent
    pub fn certificate(&self) -> Option<&str> {
        self.certificate_base64
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Successful token response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Subject of the certificate the token was issued for
    pub client_id: String,
}

/// Error body returned by both services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}
