use auth_certificate::ValidationError;
use auth_oauth::{ErrorResponse, GuardError, OAuthError};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

pub const CERTIFICATE_REQUIRED: &str =
    "Client certificate required. Send certificate in request body as base64-encoded DER format.";
pub const INVALID_CERTIFICATE_FORMAT: &str = "Invalid certificate format";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Errors returned by the issuer's HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Client certificate required")]
    CertificateRequired,

    #[error("Invalid certificate format: {0}")]
    InvalidCertificate(String),

    #[error(transparent)]
    CertificateRejected(#[from] ValidationError),

    #[error(transparent)]
    Unauthorized(#[from] GuardError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::Certificate(e) => ApiError::InvalidCertificate(e.to_string()),
            OAuthError::Validation(e) => ApiError::CertificateRejected(e),
            OAuthError::Guard(e) => ApiError::Unauthorized(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::CertificateRequired => {
                tracing::warn!("Token request without client certificate");
                unauthorized(ErrorResponse::new(CERTIFICATE_REQUIRED))
            }
            ApiError::InvalidCertificate(detail) => {
                tracing::warn!(detail = %detail, "Token request with malformed certificate");
                unauthorized(ErrorResponse::new(INVALID_CERTIFICATE_FORMAT))
            }
            ApiError::CertificateRejected(err) => unauthorized(ErrorResponse::new(err.reason())),
            ApiError::Unauthorized(err) => {
                let body = ErrorResponse::new(err.to_string()).with_status(StatusCode::UNAUTHORIZED.as_u16());
                (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Bearer")],
                    Json(body),
                )
                    .into_response()
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(INTERNAL_SERVER_ERROR)),
                )
                    .into_response()
            }
        }
    }
}

fn unauthorized(body: ErrorResponse) -> Response {
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

pub type ApiResult<T> = Result<T, ApiError>;
