//! Exporter self-metrics.
//!
//! Memory metrics are rebuilt on every scrape by the collector; the metrics
//! here describe the scrapes themselves and live in the long-lived registry.

use prometheus::{Gauge, GaugeVec, Opts, Registry};

use crate::cache::build_fq_name;
use crate::collector::PassOutcome;

/// Per-collector scrape telemetry plus exporter totals.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub scrape_collector_success: GaugeVec, // labels: collector
    pub scrape_collector_duration_seconds: GaugeVec, // labels: collector
    pub scrape_duration_seconds: Gauge,
    pub descriptor_cache_entries: Gauge,
}

impl ExporterMetrics {
    /// Creates the metrics, registering them only when `registry` is given.
    pub fn new(
        namespace: &str,
        registry: Option<&Registry>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let scrape_collector_success = GaugeVec::new(
            Opts::new(
                build_fq_name(namespace, "scrape", "collector_success"),
                "Whether a collector succeeded.",
            ),
            &["collector"],
        )?;
        let scrape_collector_duration_seconds = GaugeVec::new(
            Opts::new(
                build_fq_name(namespace, "scrape", "collector_duration_seconds"),
                "Duration of a collector scrape.",
            ),
            &["collector"],
        )?;
        let scrape_duration_seconds = Gauge::new(
            "herakles_exporter_scrape_duration_seconds",
            "Time spent serving the last /metrics request in seconds",
        )?;
        let descriptor_cache_entries = Gauge::new(
            "herakles_exporter_descriptor_cache_entries",
            "Number of cached metric descriptors",
        )?;

        if let Some(registry) = registry {
            registry.register(Box::new(scrape_collector_success.clone()))?;
            registry.register(Box::new(scrape_collector_duration_seconds.clone()))?;
            registry.register(Box::new(scrape_duration_seconds.clone()))?;
            registry.register(Box::new(descriptor_cache_entries.clone()))?;
        }

        Ok(Self {
            scrape_collector_success,
            scrape_collector_duration_seconds,
            scrape_duration_seconds,
            descriptor_cache_entries,
        })
    }

    /// Records the result of one collector pass.
    pub fn observe_pass(&self, outcome: &PassOutcome) {
        let success = if outcome.success() { 1.0 } else { 0.0 };
        self.scrape_collector_success
            .with_label_values(&[outcome.collector])
            .set(success);
        self.scrape_collector_duration_seconds
            .with_label_values(&[outcome.collector])
            .set(outcome.duration_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn test_observe_pass_sets_collector_labels() {
        let registry = Registry::new();
        let metrics = ExporterMetrics::new("node", Some(&registry)).unwrap();

        metrics.observe_pass(&PassOutcome {
            collector: "meminfo",
            duration_seconds: 0.25,
            records: 10,
            error: None,
        });
        metrics.observe_pass(&PassOutcome {
            collector: "meminfo_numa",
            duration_seconds: 0.5,
            records: 0,
            error: Some("boom".into()),
        });

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("node_scrape_collector_success{collector=\"meminfo\"} 1"));
        assert!(text.contains("node_scrape_collector_success{collector=\"meminfo_numa\"} 0"));
        assert!(text.contains("node_scrape_collector_duration_seconds{collector=\"meminfo\"} 0.25"));
    }

    #[test]
    fn test_unregistered_metrics_stay_out_of_registry() {
        let registry = Registry::new();
        let metrics = ExporterMetrics::new("node", None).unwrap();
        metrics.scrape_duration_seconds.set(1.0);
        assert!(registry.gather().is_empty());
    }
}
