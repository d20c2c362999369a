use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use oauth_client::{create_app, ClientConfig, OAuthClientServer};

/// Certificate exchange demo client
#[derive(Parser, Debug)]
#[command(name = "oauth-client")]
#[command(about = "Obtains bearer tokens with a client certificate and calls the issuer's resources")]
struct Args {
    /// Server bind address (overrides configuration)
    #[arg(long, env = "OAUTH_CLIENT_HOST")]
    host: Option<String>,

    /// Server port (overrides configuration)
    #[arg(short, long, env = "OAUTH_CLIENT_PORT")]
    port: Option<u16>,

    /// Issuer base URL (overrides configuration)
    #[arg(long, env = "OAUTH_CLIENT_API_URL")]
    api_url: Option<String>,

    /// Configuration file path (TOML, YAML or JSON)
    #[arg(short, long, env = "OAUTH_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    telemetry::init_tracing("oauth_client", args.verbose)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting OAuth client");

    let mut config = ClientConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(api_url) = args.api_url {
        config.oauth_api.base_url = api_url;
    }
    info!(issuer = %config.oauth_api.base_url, "Using issuer");

    let server = OAuthClientServer::new(&config).context("Failed to initialise OAuth client")?;

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(address = %addr, "OAuth client listening");

    axum::serve(listener, create_app(server))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("OAuth client stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
