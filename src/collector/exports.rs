//! Per-export NFSv4.1 I/O statistics.

use std::sync::Arc;

use prometheus::proto::MetricFamily;

use crate::collector::{Collector, MetricTable};
use crate::error::Result;
use crate::ganesha::{BasicStats, StatsSource};

/// Collects I/O counters for every configured export.
pub struct ExportsCollector {
    source: Arc<dyn StatsSource>,
    table: MetricTable,
    nfsv41: bool,
    // Accepted for parity with the daemon's protocol toggles; statistics
    // for versions other than v4.1 are not implemented.
    #[allow(dead_code)]
    nfsv40: bool,
    #[allow(dead_code)]
    nfsv42: bool,
}

impl ExportsCollector {
    pub fn new(source: Arc<dyn StatsSource>, nfsv40: bool, nfsv41: bool, nfsv42: bool) -> Self {
        Self {
            source,
            table: MetricTable::new("exports", &["exportid", "path"]),
            nfsv40,
            nfsv41,
            nfsv42,
        }
    }
}

impl Collector for ExportsCollector {
    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let exports = self.source.exports()?;
        let mut builder = self.table.builder();
        for export in &exports {
            let exportid = export.export_id.to_string();
            if self.nfsv41 {
                // Enumerated exports without v4.1 active still emit a full
                // zero-valued sample set; omitting them would change the
                // cardinality of the exposed series.
                let stats = if export.nfsv41 {
                    self.source.export_v41_io(export.export_id)?
                } else {
                    BasicStats::default()
                };
                builder.push(&[&exportid, &export.path], &stats);
            }
        }
        Ok(builder.finish())
    }
}
