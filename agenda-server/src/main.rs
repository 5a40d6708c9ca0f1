use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use agenda_core::Config;
use agenda_provider_icloud::ICloudCalendar;
use agenda_server::{AppState, app};

#[derive(Parser)]
#[command(name = "agenda-server")]
#[command(about = "Online booking pages backed by an iCloud calendar")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/agenda/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let calendar = ICloudCalendar::from_env(config.calendar.clone(), config.schedule.days_shown);
    if calendar.credentials().is_none() {
        tracing::warn!("username/password not set, calendar is unavailable");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.host))?;

    let state = AppState::new(config, Arc::new(calendar));
    let app = app(state)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("agenda-server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
