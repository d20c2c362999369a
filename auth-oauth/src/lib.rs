//! Certificate-to-token exchange
//!
//! This crate provides both sides of the exchange:
//! - Issuer: [`TrustPolicy`] built from configuration, [`CertificateTokenProvider`]
//!   validating a client certificate and signing a bearer JWT (HS256 or RS256)
//! - Resource server: [`ResourceGuard`] admitting or refusing bearer tokens
//!   under the same policy
//! - Client: [`OAuthClient`] submitting its certificate and caching the token
//!   in a [`TokenCache`]
//!
//! # Example
//!
//! ```no_run
//! use auth_oauth::{CertificateTokenProvider, ResourceGuard, SigningKey, TrustPolicy};
//! use auth_certificate::Certificate;
//! use chrono::Utc;
//! use secrecy::SecretString;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = Arc::new(
//!     TrustPolicy::new(SigningKey::Hmac(SecretString::new(std::env::var("JWT_SECRET")?)))?
//!         .with_expected_thumbprint("50CB563ED29BCED78C4A867F879FAEADA6203997"),
//! );
//! let provider = CertificateTokenProvider::new(Arc::clone(&policy));
//! let guard = ResourceGuard::from_policy(policy);
//!
//! let cert = Certificate::load("client.pem")?;
//! let response = provider.exchange(&cert, Utc::now())?;
//! let client = guard.authorize(&response.access_token, Utc::now())?;
//! println!("authenticated {}", client.subject);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod provider;
pub mod tokens;

pub use cache::{AccessToken, TokenCache};
pub use client::{OAuthClient, OAuthClientConfig};
pub use config::{AuthenticationSettings, SigningKey, TrustPolicy};
pub use error::*;
pub use guard::{AuthenticatedClient, ResourceGuard};
pub use models::*;
pub use provider::CertificateTokenProvider;
pub use tokens::{issue, IssuedToken, TokenClaims};
