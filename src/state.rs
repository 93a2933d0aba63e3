//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use herakles_meminfo_exporter::HealthStats;
use prometheus::Registry;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::collector::MeminfoExporter;
use crate::config::Config;
use crate::metrics::ExporterMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    /// Long-lived registry holding the exporter's own metrics.
    pub registry: Registry,
    pub metrics: ExporterMetrics,
    /// Scrapes are serialized through this lock.
    pub exporter: Arc<Mutex<MeminfoExporter>>,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
