use crate::config::ApiConfig;
use auth_oauth::{CertificateTokenProvider, ConfigError, ResourceGuard, TrustPolicy};
use std::sync::Arc;

/// Issuer service state shared by all handlers
#[derive(Clone)]
pub struct OAuthApiServer {
    /// Trust and signing rules, read-only after startup
    pub policy: Arc<TrustPolicy>,
    /// Certificate validation and token issuance
    pub provider: CertificateTokenProvider,
    /// Bearer token check for protected routes
    pub guard: ResourceGuard,
}

impl OAuthApiServer {
    /// Build the server state from configuration.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from the authentication settings; these are fatal
    /// at startup.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let policy = TrustPolicy::from_settings(&config.authentication)?;
        Ok(Self::from_policy(policy))
    }

    pub fn from_policy(policy: TrustPolicy) -> Self {
        let policy = Arc::new(policy);
        Self {
            provider: CertificateTokenProvider::new(Arc::clone(&policy)),
            guard: ResourceGuard::from_policy(Arc::clone(&policy)),
            policy,
        }
    }
}
