use crate::{
    handlers::{client, health},
    server::OAuthClientServer,
};
use axum::{routing::get, Router};

/// Create health check routes
pub fn health_routes() -> Router<OAuthClientServer> {
    Router::new().route("/health", get(health::health_check))
}

/// Create the demonstration routes
pub fn client_routes() -> Router<OAuthClientServer> {
    Router::new()
        .route("/Client/test-public", get(client::test_public))
        .route("/Client/test-secured", get(client::test_secured))
        .route("/Client/prove-oauth-works", get(client::prove_oauth_works))
}

pub fn create_routes() -> Router<OAuthClientServer> {
    Router::new().merge(health_routes()).merge(client_routes())
}
