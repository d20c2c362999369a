use auth_oauth::AuthenticationSettings;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const ENV_PREFIX: &str = "OAUTH_API";

/// Issuer service configuration
///
/// Layered from an optional file (format by extension) and `OAUTH_API__*`
/// environment variables, e.g. `OAUTH_API__AUTHENTICATION__JWT__SECRET_KEY`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub authentication: AuthenticationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7001
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ApiConfig {
    /// Load from `path` (if given) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns `config::ConfigError` if the file is missing or a value has the
    /// wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(path, None)
    }

    /// Like [`ApiConfig::load`], reading variables from `env` instead of the
    /// process environment when given.
    ///
    /// # Errors
    ///
    /// See [`ApiConfig::load`].
    pub fn from_sources(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
