//! Metric descriptor cache.
//!
//! Descriptors (fully-qualified name, help text, value type, labels) are
//! created the first time a metric name shows up and reused by every later
//! scrape. The cache belongs to one `MeminfoExporter` and dies with it.
//! Record values are never cached.

use ahash::AHashMap as HashMap;
use herakles_meminfo_exporter::meminfo::MetricKind;
use tracing::trace;

/// Label attached to every NUMA-scoped metric.
pub const NODE_LABEL: &str = "node";

/// Static description of one exported metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    pub fq_name: String,
    pub help: String,
    pub kind: MetricKind,
    /// Variable label names, `[NODE_LABEL]` for NUMA metrics.
    pub labels: &'static [&'static str],
}

/// Joins non-empty parts with `_`, e.g. `node` + `memory` + `MemFree_bytes`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Descriptor cache keyed by `(subsystem, name)`.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    namespace: String,
    descriptors: HashMap<(&'static str, String), MetricDescriptor>,
}

impl DescriptorCache {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            descriptors: HashMap::new(),
        }
    }

    /// Returns the cached descriptor, creating it on first observation.
    pub fn get_or_insert(
        &mut self,
        subsystem: &'static str,
        name: &str,
        kind: MetricKind,
        node_scoped: bool,
    ) -> &MetricDescriptor {
        let namespace = &self.namespace;
        self.descriptors
            .entry((subsystem, name.to_string()))
            .or_insert_with(|| {
                let fq_name = build_fq_name(namespace, subsystem, name);
                trace!("New metric descriptor: {} ({})", fq_name, kind);
                MetricDescriptor {
                    fq_name,
                    help: format!("Memory information field {}.", name),
                    kind,
                    labels: if node_scoped { &[NODE_LABEL] } else { &[] },
                }
            })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
