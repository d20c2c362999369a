use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use oauth_api::{create_app, ApiConfig, OAuthApiServer};

/// Certificate-to-token issuer
#[derive(Parser, Debug)]
#[command(name = "oauth-api")]
#[command(about = "Exchanges client certificates for bearer tokens and serves protected resources")]
struct Args {
    /// Server bind address (overrides configuration)
    #[arg(long, env = "OAUTH_API_HOST")]
    host: Option<String>,

    /// Server port (overrides configuration)
    #[arg(short, long, env = "OAUTH_API_PORT")]
    port: Option<u16>,

    /// Configuration file path (TOML, YAML or JSON)
    #[arg(short, long, env = "OAUTH_API_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    telemetry::init_tracing("oauth_api", args.verbose)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting OAuth API");

    let config = ApiConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let server = OAuthApiServer::new(&config).context("Invalid authentication configuration")?;

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(address = %addr, "OAuth API listening");
    info!("Token endpoint: POST http://{}/Auth/token", addr);

    axum::serve(listener, create_app(server))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("OAuth API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
