//! Observability helpers shared by the OAuth services
//!
//! - Subscriber bootstrap: pretty output in development, JSON in production
//!   (`OAUTH_ENV`), `RUST_LOG` override
//! - Bearer token redaction for log fields and diagnostic responses
//!
//! # Example
//!
//! ```no_run
//! fn main() -> Result<(), telemetry::TelemetryError> {
//!     telemetry::init_tracing("oauth_api", false)?;
//!     tracing::info!(token = %telemetry::redact_token("eyJhbGciOiJIUzI1NiJ9..."), "Token issued");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod redact;

pub use error::*;
pub use logging::{init_tracing, Environment};
pub use redact::redact_token;
