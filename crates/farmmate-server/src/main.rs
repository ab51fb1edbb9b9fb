//! # farmmate
//!
//! Gateway binary: loads settings, starts the relay and serves client
//! sockets until ctrl-c.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use farmmate_relay::RelayService;
use farmmate_server::config::{ServerConfig, relay_config};
use farmmate_server::metrics::install_recorder;
use farmmate_server::server::FarmmateServer;
use farmmate_server::telemetry::init_tracing;
use farmmate_settings::FarmmateSettings;
use tracing::info;

/// FarmMate relay gateway.
#[derive(Parser, Debug)]
#[command(name = "farmmate", about = "FarmMate relay gateway")]
struct Cli {
    /// Settings file (defaults to `~/.farmmate/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Backend worker root URL (overrides settings).
    #[arg(long)]
    backend_url: Option<String>,
}

impl Cli {
    fn apply(&self, settings: &mut FarmmateSettings) {
        if let Some(ref host) = self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(ref url) = self.backend_url {
            settings.backend.url.clone_from(url);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli
        .config
        .clone()
        .unwrap_or_else(farmmate_settings::settings_path);
    let mut settings = farmmate_settings::load_settings_from_path(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    cli.apply(&mut settings);
    farmmate_settings::validate(&settings).context("invalid settings")?;

    init_tracing(&settings.logging);
    let metrics = install_recorder()?;

    let relay = Arc::new(RelayService::with_websocket_backend(relay_config(
        &settings.backend,
    )));
    let server = FarmmateServer::new(
        ServerConfig::from_settings(&settings.server),
        relay,
        metrics,
    );

    let (addr, handle) = server.listen().await?;
    info!(%addr, backend = %settings.backend.url, "farmmate gateway started");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown signal received");

    let report = server.shutdown().drain(vec![handle]).await;
    info!(
        links_closed = report.links_closed,
        timed_out = report.timed_out,
        "farmmate gateway stopped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_settings() {
        let cli = Cli::parse_from([
            "farmmate",
            "--port",
            "7001",
            "--backend-url",
            "ws://127.0.0.1:8000",
        ]);
        let mut settings = FarmmateSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.server.port, 7001);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.backend.url, "ws://127.0.0.1:8000");
    }

    #[test]
    fn cli_without_flags_keeps_settings() {
        let cli = Cli::parse_from(["farmmate"]);
        let mut settings = FarmmateSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, FarmmateSettings::default());
        assert!(cli.config.is_none());
    }
}
