use crate::config::ClientConfig;
use crate::error::ClientError;
use auth_certificate::Certificate;
use auth_oauth::OAuthClient;
use std::sync::Arc;

/// Client service state shared by all handlers
#[derive(Clone)]
pub struct OAuthClientServer {
    /// Issuer client holding the token cache for the configured identity
    pub client: Arc<OAuthClient>,
    /// Certificate the issuer must refuse, used by the proof endpoint
    pub unauthorized_identity: Option<Arc<Certificate>>,
}

impl OAuthClientServer {
    /// Load both identities and build the issuer client.
    ///
    /// # Errors
    ///
    /// `ClientError::Identity` if a configured certificate cannot be loaded,
    /// `ClientError::HttpClient` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let identity = config.certificate.load()?;
        tracing::info!(
            subject = %identity.subject,
            thumbprint = %identity.thumbprint,
            "Loaded client certificate"
        );

        let unauthorized_identity = match &config.unauthorized_certificate {
            Some(settings) => {
                let cert = settings.load()?;
                tracing::info!(subject = %cert.subject, "Loaded unauthorized certificate for proof runs");
                Some(cert)
            }
            None => {
                tracing::warn!("No unauthorized certificate configured, /Client/prove-oauth-works is unavailable");
                None
            }
        };

        let client = OAuthClient::new(config.oauth_api.client_config(), identity).map_err(ClientError::HttpClient)?;
        Ok(Self::from_parts(client, unauthorized_identity))
    }

    pub fn from_parts(client: OAuthClient, unauthorized_identity: Option<Certificate>) -> Self {
        Self {
            client: Arc::new(client),
            unauthorized_identity: unauthorized_identity.map(Arc::new),
        }
    }
}
