//! Per-client NFSv4.1 I/O statistics.

use std::sync::Arc;

use prometheus::proto::MetricFamily;

use crate::collector::{Collector, MetricTable};
use crate::error::Result;
use crate::ganesha::{BasicStats, StatsSource};

/// Collects I/O counters for every currently connected client.
pub struct ClientsCollector {
    source: Arc<dyn StatsSource>,
    table: MetricTable,
    nfsv41: bool,
    // Same placeholder toggles as the exports collector.
    #[allow(dead_code)]
    nfsv40: bool,
    #[allow(dead_code)]
    nfsv42: bool,
}

impl ClientsCollector {
    pub fn new(source: Arc<dyn StatsSource>, nfsv40: bool, nfsv41: bool, nfsv42: bool) -> Self {
        Self {
            source,
            table: MetricTable::new("clients", &["clientip"]),
            nfsv40,
            nfsv41,
            nfsv42,
        }
    }
}

impl Collector for ClientsCollector {
    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let clients = self.source.clients()?;
        let mut builder = self.table.builder();
        for client in &clients {
            if self.nfsv41 {
                // Zero-fill clients without v4.1 active, same policy as the
                // exports collector.
                let stats = if client.nfsv41 {
                    self.source.client_v41_io(&client.address)?
                } else {
                    BasicStats::default()
                };
                builder.push(&[&client.address], &stats);
            }
        }
        Ok(builder.finish())
    }
}
