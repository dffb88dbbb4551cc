//! Command line surface. All values are fixed at process start.

use clap::ArgAction;
use clap::Parser;
use std::net::SocketAddr;

/// Prometheus exporter for NFS-Ganesha runtime statistics.
#[derive(Debug, Parser)]
#[command(name = "ganesha-exporter", version, about)]
pub struct Args {
    /// Address the metrics HTTP listener binds to.
    #[arg(long, default_value = "0.0.0.0:9587")]
    pub listen_address: SocketAddr,

    /// URL path the exposition is served under.
    #[arg(long, default_value = "/metrics")]
    pub metrics_path: String,

    /// Collect per-export statistics.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub exports_collector: bool,

    /// Collect per-client statistics.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub clients_collector: bool,

    /// Treat NFSv4.0 as enabled on the daemon.
    #[arg(long = "nfs-v40", default_value_t = true, action = ArgAction::Set)]
    pub nfsv40: bool,

    /// Treat NFSv4.1 as enabled on the daemon.
    #[arg(long = "nfs-v41", default_value_t = true, action = ArgAction::Set)]
    pub nfsv41: bool,

    /// Treat NFSv4.2 as enabled on the daemon.
    #[arg(long = "nfs-v42", default_value_t = true, action = ArgAction::Set)]
    pub nfsv42: bool,
}
