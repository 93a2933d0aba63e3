//! Root endpoint handler for the landing page.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::collector::{MEMINFO_COLLECTOR, MEMINFO_NUMA_COLLECTOR};
use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let uptime_str = format!(
        "{}h {}m {}s",
        uptime_secs / 3600,
        (uptime_secs % 3600) / 60,
        uptime_secs % 60
    );

    let collectors = [
        (MEMINFO_COLLECTOR, state.config.meminfo_enabled()),
        (MEMINFO_NUMA_COLLECTOR, state.config.numa_enabled()),
    ]
    .iter()
    .map(|(name, enabled)| {
        format!(
            "        <li><code>{name}</code>: {}</li>\n",
            if *enabled { "enabled" } else { "disabled" }
        )
    })
    .collect::<String>();

    let health_link = if state.config.enable_health.unwrap_or(true) {
        r#"        <li><a href="/health">/health</a>: exporter health and last collection pass (text)</li>"#
    } else {
        ""
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Herakles Meminfo Exporter</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; }}
        .container {{ max-width: 800px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; }}
        h1 {{ color: #333; border-bottom: 3px solid #007bff; padding-bottom: 10px; }}
        .footer {{ margin-top: 30px; color: #666; font-size: 0.9em; text-align: center; }}
    </style>
</head>
<body>
<div class="container">
    <h1>Herakles Meminfo Exporter</h1>
    <p>Version {version}, up {uptime}, namespace <code>{namespace}</code></p>

    <h2>Endpoints</h2>
    <ul>
        <li><a href="/metrics">/metrics</a>: Prometheus metrics</li>
{health_link}
    </ul>

    <h2>Collectors</h2>
    <ul>
{collectors}    </ul>

    <div class="footer"><p>{footer}</p></div>
</div>
</body>
</html>"#,
        version = version,
        uptime = uptime_str,
        namespace = state.config.namespace(),
        health_link = health_link,
        collectors = collectors,
        footer = FOOTER_TEXT
    );

    Html(html)
}
