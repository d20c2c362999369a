use crate::error::{ApiError, ApiResult};
use crate::server::OAuthApiServer;
use auth_certificate::Certificate;
use auth_oauth::{TokenRequest, TokenResponse};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

/// Header carrying a URL-encoded PEM client certificate, as forwarded by a
/// TLS-terminating proxy
pub const CLIENT_CERT_HEADER: &str = "X-Client-Cert";

/// `POST /Auth/token`: exchange a client certificate for a bearer token.
///
/// The certificate comes from the JSON body (`CertificateBase64`), or failing
/// that from the [`CLIENT_CERT_HEADER`]. A missing or unparsable body counts
/// as no certificate.
pub async fn issue_token(
    State(server): State<OAuthApiServer>,
    headers: HeaderMap,
    body: Option<Json<TokenRequest>>,
) -> ApiResult<impl IntoResponse> {
    let cert = presented_certificate(body.as_ref().and_then(|Json(req)| req.certificate()), &headers)?;

    tracing::info!(
        subject = %cert.subject,
        thumbprint = %cert.thumbprint,
        "Token request received"
    );

    let response: TokenResponse = server.provider.exchange(&cert, Utc::now())?;

    Ok((
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(response),
    ))
}

fn presented_certificate(body_certificate: Option<&str>, headers: &HeaderMap) -> ApiResult<Certificate> {
    if let Some(encoded) = body_certificate {
        return Certificate::from_base64_der(encoded)
            .map_err(|e| ApiError::InvalidCertificate(e.to_string()));
    }

    let forwarded = headers
        .get(CLIENT_CERT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::CertificateRequired)?;

    tracing::debug!("Using certificate forwarded in {}", CLIENT_CERT_HEADER);
    let decoded = urlencoding::decode(forwarded)
        .map_err(|e| ApiError::InvalidCertificate(format!("invalid URL encoding: {}", e)))?;

    let parsed = if decoded.trim_start().starts_with("-----BEGIN") {
        Certificate::from_pem(&decoded)
    } else {
        Certificate::from_base64_der(&decoded)
    };
    parsed.map_err(|e| ApiError::InvalidCertificate(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use auth_certificate::testutil;
    use axum::http::HeaderValue;

    #[test]
    fn test_body_takes_precedence() {
        let body_cert = testutil::client_certificate("FromBody");
        let mut headers = HeaderMap::new();
        headers.insert(
            CLIENT_CERT_HEADER,
            HeaderValue::from_str(&urlencoding::encode(testutil::SIGNING_CERTIFICATE_PEM)).unwrap(),
        );

        let cert = presented_certificate(Some(&body_cert.to_base64_der()), &headers).unwrap();
        assert_eq!(cert.subject, "CN=FromBody");
    }

    #[test]
    fn test_forwarded_pem_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CLIENT_CERT_HEADER,
            HeaderValue::from_str(&urlencoding::encode(testutil::SIGNING_CERTIFICATE_PEM)).unwrap(),
        );

        let cert = presented_certificate(None, &headers).unwrap();
        assert_eq!(cert.thumbprint, testutil::SIGNING_THUMBPRINT);
    }

    #[test]
    fn test_no_certificate_anywhere() {
        let err = presented_certificate(None, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ApiError::CertificateRequired));
    }

    #[test]
    fn test_garbage_body_certificate() {
        let err = presented_certificate(Some("bm90IGEgY2VydA=="), &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidCertificate(_)));
    }
}
