use auth_certificate::CertLoadError;
use auth_oauth::AcquisitionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

pub const TOKEN_ACQUISITION_FAILED: &str = "Failed to acquire access token using certificate";

/// Errors returned by the client service's handlers
#[derive(Error, Debug)]
pub enum ClientError {
    /// The configured identity could not obtain a token
    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(#[source] AcquisitionError),

    /// A resource call to the issuer failed
    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: AcquisitionError,
    },

    #[error("Unauthorized certificate not configured")]
    UnauthorizedIdentityMissing,

    #[error("Failed to load identity: {0}")]
    Identity(#[from] CertLoadError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] AcquisitionError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            message: None,
        }
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ClientError::TokenAcquisition(err) => {
                tracing::warn!(error = %err, "Could not acquire access token");
                (StatusCode::UNAUTHORIZED, ErrorBody::new(TOKEN_ACQUISITION_FAILED))
            }
            ClientError::Upstream {
                context,
                source: AcquisitionError::Status { status, body },
            } => {
                tracing::warn!(status = %status, context, "Issuer refused resource call");
                (
                    status,
                    ErrorBody {
                        details: Some(body),
                        ..ErrorBody::new(context)
                    },
                )
            }
            ClientError::Upstream { context, source } => {
                tracing::error!(error = %source, context, "Resource call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(context))
            }
            ClientError::UnauthorizedIdentityMissing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    message: Some(
                        "Set unauthorized_certificate.path to a certificate the issuer does not trust".to_string(),
                    ),
                    ..ErrorBody::new("Unauthorized certificate not found")
                },
            ),
            other @ (ClientError::Identity(_) | ClientError::HttpClient(_)) => {
                tracing::error!(error = %other, "Client service misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new("Internal server error"))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
