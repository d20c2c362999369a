use auth_certificate::{CertLoadError, Certificate};
use auth_oauth::client::DEFAULT_TIMEOUT_SECS;
use auth_oauth::OAuthClientConfig;
use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "OAUTH_CLIENT";

/// Client service configuration
///
/// Layered like the issuer's: optional file, then `OAUTH_CLIENT__*`
/// variables such as `OAUTH_CLIENT__OAUTH_API__BASE_URL` or
/// `OAUTH_CLIENT__CERTIFICATE__PASSWORD`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub oauth_api: OAuthApiSettings,

    /// Identity used for every cached token
    #[serde(default)]
    pub certificate: IdentitySettings,

    /// Identity the issuer is expected to refuse, for the proof endpoint
    #[serde(default)]
    pub unauthorized_certificate: Option<IdentitySettings>,
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
    7002
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_base_url() -> String {
    "https://localhost:7001".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for OAuthApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: false,
        }
    }
}

impl OAuthApiSettings {
    pub fn client_config(&self) -> OAuthClientConfig {
        OAuthClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

/// PEM bundle holding a certificate and its private key
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    #[serde(default = "default_identity_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub password: Option<SecretString>,
}

fn default_identity_path() -> PathBuf {
    PathBuf::from("certificates/oauth-demo.pem")
}

impl IdentitySettings {
    /// Load the certificate and private key, decrypting with the password if
    /// one is set.
    ///
    /// # Errors
    ///
    /// Any [`CertLoadError`] from reading or decoding the bundle.
    pub fn load(&self) -> Result<Certificate, CertLoadError> {
        let passphrase = self.password.as_ref().map(|p| p.expose_secret().as_str());
        Certificate::load_identity(&self.path, passphrase)
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            path: default_identity_path(),
            password: None,
        }
    }
}

impl ClientConfig {
    /// Load from `path` (if given) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns `config::ConfigError` if the file is missing or a value has the
    /// wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(path, None)
    }

    /// # Errors
    ///
    /// See [`ClientConfig::load`].
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
