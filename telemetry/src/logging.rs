use crate::error::{Result, TelemetryError};
use std::env;
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_VAR: &str = "OAUTH_ENV";

/// Deployment environment, read from `OAUTH_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Anything other than `production` (case-insensitive) is development.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn from_env() -> Self {
        env::var(ENV_VAR).map_or(Environment::Development, |v| Self::parse(&v))
    }
}

/// Default filter directives when `RUST_LOG` is unset
pub fn default_directives(crate_target: &str, verbose: bool) -> String {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    format!(
        "{crate_target}={level},auth_oauth={level},auth_certificate={level},tower_http=info,hyper=info,reqwest=info"
    )
}

/// Install the global subscriber.
///
/// Development gets human-readable output with targets and source locations;
/// production gets one JSON object per event. `RUST_LOG` overrides the
/// default directives.
///
/// # Errors
///
/// Returns `TelemetryError::TracingError` if a global subscriber is already set.
pub fn init_tracing(crate_target: &str, verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(crate_target, verbose)));

    let result = match Environment::from_env() {
        Environment::Development => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(env::var("NO_COLOR").is_err()),
            )
            .try_init(),
        Environment::Production => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::TracingError(e.to_string()))
}
