//! OAuth API - certificate-to-token issuer
//!
//! Exchanges client X.509 certificates for signed bearer tokens
//! (`POST /Auth/token`) and serves sample forecast resources, some of them
//! behind the bearer token guard.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use config::ApiConfig;
pub use error::*;
pub use server::OAuthApiServer;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the application router with all routes and middleware
pub fn create_app(server: OAuthApiServer) -> Router {
    routes::create_routes(&server)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer()),
        )
        .with_state(server)
}
