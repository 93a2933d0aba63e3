//! Canonical metric records produced by every memory source.

use serde::Serialize;
use std::fmt;

/// Suffix marking a monotonically increasing value.
pub const COUNTER_SUFFIX: &str = "_total";

/// Prometheus value type of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    /// Counter iff the name ends in `_total`.
    pub fn from_name(name: &str) -> Self {
        if name.ends_with(COUNTER_SUFFIX) {
            MetricKind::Counter
        } else {
            MetricKind::Gauge
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized memory statistic.
///
/// `kind` is fixed at construction: either derived from the name
/// ([`MetricRecord::from_name`]) or stated by the parser that produced the
/// record ([`MetricRecord::gauge`], [`MetricRecord::counter`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub name: String,
    kind: MetricKind,
    pub value: f64,
    /// NUMA node id, empty when the record is not node scoped.
    pub node: String,
}

impl MetricRecord {
    /// Record with the kind inferred from the `_total` suffix and no node.
    pub fn from_name(name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        let kind = MetricKind::from_name(&name);
        Self {
            name,
            kind,
            value,
            node: String::new(),
        }
    }

    pub fn gauge(name: impl Into<String>, value: f64, node: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Gauge,
            value,
            node: node.into(),
        }
    }

    pub fn counter(name: impl Into<String>, value: f64, node: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Counter,
            value,
            node: node.into(),
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn is_node_scoped(&self) -> bool {
        !self.node.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        assert_eq!(MetricKind::from_name("swapped_in_bytes_total"), MetricKind::Counter);
        assert_eq!(MetricKind::from_name("MemTotal_bytes"), MetricKind::Gauge);
        // Case sensitive, like the suffix itself.
        assert_eq!(MetricKind::from_name("HugePages_Total"), MetricKind::Gauge);
    }

    #[test]
    fn test_explicit_kind_is_kept() {
        let r = MetricRecord::gauge("odd_total", 1.0, "0");
        assert_eq!(r.kind(), MetricKind::Gauge);
        assert!(r.is_node_scoped());

        let r = MetricRecord::counter("numa_hit_total", 1.0, "1");
        assert_eq!(r.kind(), MetricKind::Counter);
    }

    #[test]
    fn test_from_name_has_no_node() {
        let r = MetricRecord::from_name("pgfault_total", 3.0);
        assert_eq!(r.kind(), MetricKind::Counter);
        assert_eq!(r.node, "");
        assert!(!r.is_node_scoped());
    }
}
