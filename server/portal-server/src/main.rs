use anyhow::Context;
use auth_rebac::KetoClient;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use portal_server::{create_app, AppState, PortalSettings};

/// Agent portal HTTP server
#[derive(Parser, Debug)]
#[command(name = "portal-server")]
#[command(about = "Authorization decisions and identity-provider hooks for the agent portal")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "PORTAL__CONFIG__FILE", default_value = portal_server::settings::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Listen address, overrides `server.address`
    #[arg(long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = PortalSettings::load(&args.config)
        .with_context(|| format!("loading settings from {}", args.config.display()))?;
    if let Some(address) = args.address {
        settings.server.address = address;
    }

    logger_redacted::init(&settings.logging).context("initialising logger")?;

    let client = KetoClient::new(&settings.keto).context("building keto client")?;
    if !client.has_write_endpoint() {
        warn!("keto write remote is not configured; registration hooks will fail");
    }

    let app = create_app(AppState::new(Arc::new(client), &settings));

    let listener = tokio::net::TcpListener::bind(&settings.server.address)
        .await
        .with_context(|| format!("binding {}", settings.server.address))?;

    info!(
        address = %settings.server.address,
        read_remote = %settings.keto.read_remote,
        namespace = %settings.keto.namespace_prefix,
        "starting http server"
    );

    axum::serve(listener, app).await.context("http server error")?;
    Ok(())
}
