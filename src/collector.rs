//! Shared metric-definition scaffolding for the stat collectors.
//!
//! The NFSv4.1 measure set is a fixed table; each collector instance derives
//! its full metric names from it once at construction and reuses them for
//! every scrape. All samples are constant counters rebuilt per scrape from
//! the daemon's own cumulative values.

pub mod clients;
pub mod exports;

use prometheus::proto::{Counter, LabelPair, Metric, MetricFamily, MetricType};

use crate::error::Result;
use crate::ganesha::{BasicStats, IoCounters};

/// One registrable stat collector.
pub trait Collector: Send + Sync {
    /// Metric families this collector produces, discovered by running a
    /// real collection (describe-by-collect).
    fn describe(&self) -> Result<Vec<MetricFamily>> {
        self.collect()
    }

    /// Run one full collection. A failure means no samples at all for this
    /// collector on this scrape; partial output is never produced.
    fn collect(&self) -> Result<Vec<MetricFamily>>;
}

/// One of the six NFSv4.1 I/O measures.
struct Measure {
    suffix: &'static str,
    help: &'static str,
    value: fn(&IoCounters) -> f64,
}

/// Fixed measure table. Order here is emission order within a direction.
/// `transfered` is the daemon's historical exposition spelling.
const MEASURES: [Measure; 6] = [
    Measure {
        suffix: "requested_bytes_total",
        help: "Number of requested bytes for NFSv4.1 operations",
        value: |io| io.requested as f64,
    },
    Measure {
        suffix: "transfered_bytes_total",
        help: "Number of transfered bytes for NFSv4.1 operations",
        value: |io| io.transferred as f64,
    },
    Measure {
        suffix: "operations_total",
        help: "Number of operations for NFSv4.1",
        value: |io| io.total as f64,
    },
    Measure {
        suffix: "operations_errors_total",
        help: "Number of operations in error for NFSv4.1",
        value: |io| io.errors as f64,
    },
    Measure {
        suffix: "operations_latency_seconds_total",
        help: "Cumulative time consumed by operations for NFSv4.1",
        value: |io| io.latency as f64 / 1e9,
    },
    Measure {
        suffix: "operations_queue_wait_seconds_total",
        help: "Cumulative time spent in rpc wait queue for NFSv4.1",
        value: |io| io.queue_wait as f64 / 1e9,
    },
];

/// Immutable name/label configuration for one collector instance.
pub(crate) struct MetricTable {
    names: Vec<String>,
    entity_labels: &'static [&'static str],
}

impl MetricTable {
    /// `subject` is "exports" or "clients"; `entity_labels` are the label
    /// names that follow `direction` on every sample.
    pub(crate) fn new(subject: &str, entity_labels: &'static [&'static str]) -> Self {
        let names = MEASURES
            .iter()
            .map(|measure| format!("ganesha_{subject}_nfs_v41_{}", measure.suffix))
            .collect();
        Self {
            names,
            entity_labels,
        }
    }

    pub(crate) fn builder(&self) -> FamilyBuilder<'_> {
        let families = self
            .names
            .iter()
            .zip(&MEASURES)
            .map(|(name, measure)| {
                let mut family = MetricFamily::default();
                family.set_name(name.clone());
                family.set_help(measure.help.to_string());
                family.set_field_type(MetricType::COUNTER);
                family
            })
            .collect();
        FamilyBuilder {
            table: self,
            families,
        }
    }
}

/// Per-scrape sample accumulator.
///
/// `push` appends the twelve samples for one entity: six read measures then
/// six write measures, each labeled `direction` first and then the entity
/// labels in table order. Entities keep the enumeration order they were
/// pushed in.
pub(crate) struct FamilyBuilder<'a> {
    table: &'a MetricTable,
    families: Vec<MetricFamily>,
}

impl FamilyBuilder<'_> {
    pub(crate) fn push(&mut self, entity_values: &[&str], stats: &BasicStats) {
        debug_assert_eq!(entity_values.len(), self.table.entity_labels.len());
        for (direction, io) in [("read", &stats.read), ("write", &stats.write)] {
            for (family, measure) in self.families.iter_mut().zip(&MEASURES) {
                let mut metric = Metric::default();
                let mut labels = Vec::with_capacity(entity_values.len() + 1);
                labels.push(label_pair("direction", direction));
                for (name, value) in self.table.entity_labels.iter().zip(entity_values) {
                    labels.push(label_pair(name, value));
                }
                metric.set_label(labels.into());
                let mut counter = Counter::default();
                counter.set_value((measure.value)(io));
                metric.set_counter(counter);
                family.mut_metric().push(metric);
            }
        }
    }

    /// Finish the scrape. Families that collected no samples are dropped so
    /// an empty enumeration renders nothing.
    pub(crate) fn finish(self) -> Vec<MetricFamily> {
        self.families
            .into_iter()
            .filter(|family| !family.get_metric().is_empty())
            .collect()
    }
}

fn label_pair(name: &str, value: &str) -> LabelPair {
    let mut pair = LabelPair::default();
    pair.set_name(name.to_string());
    pair.set_value(value.to_string());
    pair
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ganesha::BasicStats;

    /// Flatten families into (name, labels, value) samples for assertions.
    pub(crate) fn samples(families: &[MetricFamily]) -> Vec<(String, Vec<(String, String)>, f64)> {
        families
            .iter()
            .flat_map(|family| {
                family.get_metric().iter().map(|metric| {
                    let labels = metric
                        .get_label()
                        .iter()
                        .map(|pair| (pair.get_name().to_string(), pair.get_value().to_string()))
                        .collect();
                    (
                        family.get_name().to_string(),
                        labels,
                        metric.get_counter().get_value(),
                    )
                })
            })
            .collect()
    }

    pub(crate) fn label<'a>(labels: &'a [(String, String)], name: &str) -> &'a str {
        labels
            .iter()
            .find(|(label_name, _)| label_name == name)
            .map(|(_, value)| value.as_str())
            .unwrap()
    }

    #[test]
    fn table_derives_full_metric_names() {
        let table = MetricTable::new("exports", &["exportid", "path"]);
        assert_eq!(
            table.names[0],
            "ganesha_exports_nfs_v41_requested_bytes_total"
        );
        assert_eq!(
            table.names[5],
            "ganesha_exports_nfs_v41_operations_queue_wait_seconds_total"
        );
    }

    #[test]
    fn push_emits_read_then_write_per_entity() {
        let table = MetricTable::new("clients", &["clientip"]);
        let mut builder = table.builder();
        builder.push(&["10.0.0.1"], &BasicStats::default());
        let families = builder.finish();

        assert_eq!(families.len(), 6);
        for family in &families {
            let directions: Vec<_> = family
                .get_metric()
                .iter()
                .map(|metric| metric.get_label()[0].get_value().to_string())
                .collect();
            assert_eq!(directions, ["read", "write"]);
        }
    }

    #[test]
    fn empty_builder_renders_no_families() {
        let table = MetricTable::new("exports", &["exportid", "path"]);
        assert!(table.builder().finish().is_empty());
    }
}
