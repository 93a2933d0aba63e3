//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every request runs a fresh collection pass on a blocking thread; nothing
//! is served from a previous scrape.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::collector::Scrape;
use crate::state::{AppState, SharedState};

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 64 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    CollectionAborted,
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        let body = match self {
            MetricsError::CollectionAborted => "Collection pass aborted",
            MetricsError::EncodingFailed => "Failed to encode metrics",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Feeds the outcome of a scrape into health stats and self-metrics.
pub fn observe_scrape(state: &AppState, scrape: &Scrape) {
    let mut records = 0u64;
    let mut duration = 0.0;
    let mut errors = Vec::new();

    for outcome in &scrape.outcomes {
        state.metrics.observe_pass(outcome);
        records += outcome.records as u64;
        duration += outcome.duration_seconds;
        if let Some(err) = &outcome.error {
            error!("Collector {} failed: {}", outcome.collector, err);
            errors.push(format!("{}: {}", outcome.collector, err));
        }
    }

    if errors.is_empty() {
        state.health_stats.record_pass_success(records, duration);
    } else {
        state
            .health_stats
            .record_pass_failure(&errors.join("; "), duration);
    }

    state
        .health_stats
        .record_descriptor_cache_size(scrape.descriptor_count as u64);
    state
        .metrics
        .descriptor_cache_entries
        .set(scrape.descriptor_count as f64);
}

/// Runs one scrape on the blocking pool.
pub async fn run_scrape(state: &AppState) -> Result<Scrape, MetricsError> {
    let exporter = state.exporter.clone();
    tokio::task::spawn_blocking(move || {
        // A panic in an earlier pass leaves only the descriptor cache behind.
        let mut exporter = exporter.lock().unwrap_or_else(|e| e.into_inner());
        exporter.scrape()
    })
    .await
    .map_err(|e| {
        error!("Collection task failed: {}", e);
        MetricsError::CollectionAborted
    })
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");
    state.health_stats.record_http_request();

    let scrape = run_scrape(&state).await?;
    observe_scrape(&state, &scrape);

    state
        .metrics
        .scrape_duration_seconds
        .set(start.elapsed().as_secs_f64());

    let mut families = scrape.families;
    families.extend(state.registry.gather());

    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    let encoder = TextEncoder::new();

    if encoder.encode(&families, &mut buffer).is_err() {
        error!("Failed to encode Prometheus metrics");
        return Err(MetricsError::EncodingFailed);
    }

    state
        .health_stats
        .record_metrics_response_size_kb(buffer.len() as f64 / 1024.0);
    state.health_stats.record_metrics_endpoint_call();

    debug!(
        "Metrics request completed: {} families, {} bytes, {:.3}ms",
        families.len(),
        buffer.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}
