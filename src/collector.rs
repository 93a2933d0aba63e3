//! Collection passes and their translation into Prometheus metric families.
//!
//! Every scrape runs one pass per enabled collector. A pass either yields
//! all of its records or none of them: a failed collector contributes no
//! families to the scrape, only a failed `PassOutcome`.

use std::collections::BTreeMap;
use std::time::Instant;

use herakles_meminfo_exporter::meminfo::{
    assemble_meminfo, platform_source, MemInfoSource, MeminfoError, MetricKind,
    MetricRecord, NumaCollector, MEMINFO_NUMA_SUBSYSTEM, MEMINFO_SUBSYSTEM,
};
use prometheus::proto::MetricFamily;
use prometheus::{Counter, CounterVec, Gauge, GaugeVec, Opts, Registry};
use tracing::{debug, instrument};

use crate::cache::{DescriptorCache, MetricDescriptor};
use crate::config::Config;

/// Collector name of the aggregate memory family.
pub const MEMINFO_COLLECTOR: &str = "meminfo";

/// Collector name of the per-NUMA-node family.
pub const MEMINFO_NUMA_COLLECTOR: &str = "meminfo_numa";

/// Errors turning a pass into metric families.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("couldn't get meminfo: {0}")]
    Meminfo(#[source] MeminfoError),

    #[error("couldn't get NUMA meminfo: {0}")]
    Numa(#[source] MeminfoError),

    #[error("failed to build metric {name}: {source}")]
    Metric {
        name: String,
        #[source]
        source: prometheus::Error,
    },

    #[error("counter {name} has invalid value {value}")]
    InvalidCounter { name: String, value: f64 },

    #[error("metric {name} is reported both as gauge and as counter")]
    MixedKinds { name: String },
}

/// Result of one collector's pass within a scrape.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub collector: &'static str,
    pub duration_seconds: f64,
    pub records: usize,
    pub error: Option<String>,
}

impl PassOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything one scrape produced.
pub struct Scrape {
    pub families: Vec<MetricFamily>,
    pub outcomes: Vec<PassOutcome>,
    pub descriptor_count: usize,
}

/// Owns the enabled memory sources and the descriptor cache.
pub struct MeminfoExporter {
    meminfo: Option<Box<dyn MemInfoSource>>,
    numa: Option<NumaCollector>,
    descriptors: DescriptorCache,
}

impl MeminfoExporter {
    pub fn from_config(config: &Config) -> Self {
        let meminfo = config
            .meminfo_enabled()
            .then(|| platform_source(config.procfs_path()));
        let numa = config
            .numa_enabled()
            .then(|| NumaCollector::new(config.sysfs_path()));

        Self {
            meminfo,
            numa,
            descriptors: DescriptorCache::new(config.namespace()),
        }
    }

    /// Names of the enabled collectors, in pass order.
    pub fn collectors(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.meminfo.is_some() {
            names.push(MEMINFO_COLLECTOR);
        }
        if self.numa.is_some() {
            names.push(MEMINFO_NUMA_COLLECTOR);
        }
        names
    }

    /// One pass of the aggregate collector, `None` when disabled.
    pub fn collect_meminfo(&self) -> Option<Result<Vec<MetricRecord>, CollectError>> {
        self.meminfo.as_deref().map(|source| {
            let info = source.mem_info().map_err(CollectError::Meminfo)?;
            let records = assemble_meminfo(info);
            debug!(
                "Set node_mem from {} source: {}",
                source.name(),
                records
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Ok(records)
        })
    }

    /// One pass of the NUMA collector, `None` when disabled.
    pub fn collect_numa(&self) -> Option<Result<Vec<MetricRecord>, CollectError>> {
        self.numa
            .as_ref()
            .map(|numa| numa.collect().map_err(CollectError::Numa))
    }

    /// Runs every enabled collector and converts the records.
    #[instrument(skip(self))]
    pub fn scrape(&mut self) -> Scrape {
        let mut families = Vec::new();
        let mut outcomes = Vec::new();

        let passes: [(&'static str, &'static str, bool); 2] = [
            (MEMINFO_COLLECTOR, MEMINFO_SUBSYSTEM, false),
            (MEMINFO_NUMA_COLLECTOR, MEMINFO_NUMA_SUBSYSTEM, true),
        ];

        for (collector, subsystem, node_scoped) in passes {
            let start = Instant::now();
            let records = if node_scoped {
                self.collect_numa()
            } else {
                self.collect_meminfo()
            };
            let Some(records) = records else {
                continue;
            };

            let result = records.and_then(|records| {
                let count = records.len();
                self.build_families(subsystem, node_scoped, &records)
                    .map(|f| (count, f))
            });
            let duration_seconds = start.elapsed().as_secs_f64();

            match result {
                Ok((count, collector_families)) => {
                    debug!(
                        "Collector {} produced {} records in {:.4}s",
                        collector, count, duration_seconds
                    );
                    families.extend(collector_families);
                    outcomes.push(PassOutcome {
                        collector,
                        duration_seconds,
                        records: count,
                        error: None,
                    });
                }
                Err(e) => outcomes.push(PassOutcome {
                    collector,
                    duration_seconds,
                    records: 0,
                    error: Some(e.to_string()),
                }),
            }
        }

        Scrape {
            families,
            outcomes,
            descriptor_count: self.descriptors.len(),
        }
    }

    /// Builds the families of one collector in a private registry so that a
    /// failure leaves nothing half-registered.
    fn build_families(
        &mut self,
        subsystem: &'static str,
        node_scoped: bool,
        records: &[MetricRecord],
    ) -> Result<Vec<MetricFamily>, CollectError> {
        let registry = Registry::new();

        if node_scoped {
            let mut by_name: BTreeMap<&str, Vec<&MetricRecord>> = BTreeMap::new();
            for record in records {
                by_name.entry(record.name.as_str()).or_default().push(record);
            }
            for (name, group) in by_name {
                let kind = group[0].kind();
                if group.iter().any(|r| r.kind() != kind) {
                    return Err(CollectError::MixedKinds {
                        name: name.to_string(),
                    });
                }
                let desc = self
                    .descriptors
                    .get_or_insert(subsystem, name, kind, true)
                    .clone();
                register_node_scoped(&registry, &desc, &group)?;
            }
        } else {
            for record in records {
                let desc = self
                    .descriptors
                    .get_or_insert(subsystem, &record.name, record.kind(), false)
                    .clone();
                register_single(&registry, &desc, record.value)?;
            }
        }

        Ok(registry.gather())
    }
}

fn metric_error(desc: &MetricDescriptor) -> impl FnOnce(prometheus::Error) -> CollectError + '_ {
    move |source| CollectError::Metric {
        name: desc.fq_name.clone(),
        source,
    }
}

fn check_counter(desc: &MetricDescriptor, value: f64) -> Result<(), CollectError> {
    // Also rejects NaN.
    if !(value >= 0.0) {
        return Err(CollectError::InvalidCounter {
            name: desc.fq_name.clone(),
            value,
        });
    }
    Ok(())
}

fn register_single(registry: &Registry, desc: &MetricDescriptor, value: f64) -> Result<(), CollectError> {
    let opts = Opts::new(desc.fq_name.clone(), desc.help.clone());
    match desc.kind {
        MetricKind::Gauge => {
            let gauge = Gauge::with_opts(opts).map_err(metric_error(desc))?;
            gauge.set(value);
            registry
                .register(Box::new(gauge))
                .map_err(metric_error(desc))
        }
        MetricKind::Counter => {
            check_counter(desc, value)?;
            let counter = Counter::with_opts(opts).map_err(metric_error(desc))?;
            counter.inc_by(value);
            registry
                .register(Box::new(counter))
                .map_err(metric_error(desc))
        }
    }
}

fn register_node_scoped(
    registry: &Registry,
    desc: &MetricDescriptor,
    records: &[&MetricRecord],
) -> Result<(), CollectError> {
    let opts = Opts::new(desc.fq_name.clone(), desc.help.clone());
    match desc.kind {
        MetricKind::Gauge => {
            let vec = GaugeVec::new(opts, desc.labels).map_err(metric_error(desc))?;
            for record in records {
                vec.with_label_values(&[record.node.as_str()])
                    .set(record.value);
            }
            registry.register(Box::new(vec)).map_err(metric_error(desc))
        }
        MetricKind::Counter => {
            let vec = CounterVec::new(opts, desc.labels).map_err(metric_error(desc))?;
            for record in records {
                check_counter(desc, record.value)?;
                // Absolute value from the kernel: reset, then set via inc_by.
                let counter = vec.with_label_values(&[record.node.as_str()]);
                counter.reset();
                counter.inc_by(record.value);
            }
            registry.register(Box::new(vec)).map_err(metric_error(desc))
        }
    }
}

/// Convenience for callers that want the records of every enabled collector
/// without building families (used by `check` and `test`).
pub fn collect_records(
    exporter: &MeminfoExporter,
) -> Vec<(&'static str, Result<Vec<MetricRecord>, CollectError>)> {
    let mut passes = Vec::new();
    if let Some(result) = exporter.collect_meminfo() {
        passes.push((MEMINFO_COLLECTOR, result));
    }
    if let Some(result) = exporter.collect_numa() {
        passes.push((MEMINFO_NUMA_COLLECTOR, result));
    }
    passes
}
