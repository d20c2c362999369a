use crate::error::ApiError;
use crate::server::OAuthApiServer;
use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};

/// Admit requests carrying a valid bearer token.
///
/// The [`AuthenticatedClient`](auth_oauth::AuthenticatedClient) is inserted
/// into request extensions for downstream handlers.
pub async fn require_bearer(
    State(server): State<OAuthApiServer>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let client = server.guard.authorize_header(authorization, Utc::now())?;
    tracing::debug!(
        subject = %client.subject,
        path = %request.uri().path(),
        "Authenticated request"
    );

    request.extensions_mut().insert(client);
    Ok(next.run(request).await)
}

pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::WWW_AUTHENTICATE])
}
