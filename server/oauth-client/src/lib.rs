//! OAuth client - demo service for the certificate-to-token exchange
//!
//! Holds a client certificate, obtains bearer tokens from the issuer through
//! a cached [`auth_oauth::OAuthClient`], and exposes endpoints that exercise
//! the public and secured resources.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

pub use config::ClientConfig;
pub use error::*;
pub use server::OAuthClientServer;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the application router with all routes and middleware
pub fn create_app(server: OAuthClientServer) -> Router {
    routes::create_routes()
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(server)
}
