//! Prometheus exporter for NFS-Ganesha.
//!
//! Scrapes per-export and per-client NFSv4.1 I/O counters from the daemon's
//! D-Bus management interface and serves them as a Prometheus endpoint.

mod collector;
mod config;
mod error;
mod ganesha;
mod server;

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;

use crate::collector::clients::ClientsCollector;
use crate::collector::exports::ExportsCollector;
use crate::config::Args;
use crate::ganesha::StatsSource;
use crate::ganesha::dbus::DbusStatsSource;
use crate::server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    anyhow::ensure!(
        args.metrics_path.starts_with('/'),
        "--metrics-path must start with '/'"
    );

    let source: Arc<dyn StatsSource> = Arc::new(
        DbusStatsSource::connect().context("failed to connect to the ganesha dbus service")?,
    );

    let mut state = AppState::new().context("failed to set up the metrics registry")?;
    if args.exports_collector {
        state.register(Box::new(ExportsCollector::new(
            Arc::clone(&source),
            args.nfsv40,
            args.nfsv41,
            args.nfsv42,
        )));
    }
    if args.clients_collector {
        state.register(Box::new(ClientsCollector::new(
            Arc::clone(&source),
            args.nfsv40,
            args.nfsv41,
            args.nfsv42,
        )));
    }

    let app = server::router(&args.metrics_path, Arc::new(state));
    let listener = tokio::net::TcpListener::bind(args.listen_address)
        .await
        .with_context(|| format!("failed to bind {}", args.listen_address))?;
    tracing::info!(address = %args.listen_address, path = %args.metrics_path, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
