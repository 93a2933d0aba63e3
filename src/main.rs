//! herakles-meminfo-exporter
//!
//! Operating-system memory statistics exporter with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cache;
mod cli;
mod collector;
mod commands;
mod config;
mod handlers;
mod metrics;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use clap::Parser;
use herakles_meminfo_exporter::HealthStats;
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info};

use cli::{Args, Commands};
use collector::MeminfoExporter;
use commands::{command_check, command_config, command_test};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{health_handler, metrics_handler, root_handler};
use metrics::ExporterMetrics;
use state::AppState;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config) {
    let log_level = config.log_filter().unwrap_or(tracing::level_filters::LevelFilter::INFO);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {}", log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config);

        return match command {
            Commands::Check { numa } => command_check(*numa, &config),
            Commands::Test {
                iterations,
                verbose,
                format,
            } => command_test(*iterations, *verbose, format.clone(), &config),
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&config);

    info!("Starting herakles-meminfo-exporter");

    if let Err(e) = startup_checks::validate_requirements(&config) {
        error!("❌ Startup validation failed: {}", e);
        error!("   The exporter will start but scrapes of this collector will fail!");
    }

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    let telemetry = config.enable_telemetry.unwrap_or(true);
    let metrics = ExporterMetrics::new(config.namespace(), telemetry.then_some(&registry))?;
    debug!("Exporter metrics initialized (telemetry: {})", telemetry);

    let exporter = MeminfoExporter::from_config(&config);
    info!("Enabled collectors: {}", exporter.collectors().join(", "));

    let state = Arc::new(AppState {
        registry,
        metrics,
        exporter: Arc::new(Mutex::new(exporter)),
        config: Arc::new(config.clone()),
        health_stats: Arc::new(HealthStats::new()),
        start_time: Instant::now(),
    });

    // Initial pass surfaces broken sources in the log before the first scrape
    info!("Performing initial collection pass");
    match handlers::metrics::run_scrape(&state).await {
        Ok(scrape) => {
            handlers::metrics::observe_scrape(&state, &scrape);
            if scrape.outcomes.iter().all(|o| o.success()) {
                info!(
                    "Initial collection pass completed: {} descriptors",
                    scrape.descriptor_count
                );
            }
        }
        Err(e) => error!("Initial collection pass failed: {:?}", e),
    }

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state.clone());

    let listener = TcpListener::bind(addr).await?;
    info!(
        "herakles-meminfo-exporter listening on http://{}:{}",
        bind_ip_str, port
    );

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("herakles-meminfo-exporter stopped gracefully");
    Ok(())
}
