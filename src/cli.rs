//! CLI arguments and subcommands for herakles-meminfo-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for the `test` subcommand
#[derive(Debug, Clone, ValueEnum)]
pub enum RecordFormat {
    Table,
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-meminfo-exporter",
    about = "Prometheus exporter for operating-system memory statistics",
    long_about = "Prometheus exporter for operating-system memory statistics.\n\n\
                  Exposes /proc/meminfo fields (normalized to bytes), per-NUMA-node \
                  meminfo and numastat counters on Linux, and native VM statistics on macOS.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version,
    propagate_version = true,
    after_help = "Project: https://github.com/cansp-dev/herakles-node-exporter | More info: https://www.herakles.now | Support: exporter@herakles.now"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level [default: info]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Metric namespace (prefix of every exported metric name)
    #[arg(long)]
    pub namespace: Option<String>,

    /// procfs mount point
    #[arg(long)]
    pub procfs: Option<PathBuf>,

    /// sysfs mount point
    #[arg(long)]
    pub sysfs: Option<PathBuf>,

    /// Enable the per-NUMA-node collector (disabled by default)
    #[arg(long)]
    pub enable_numa: bool,

    /// Disable the aggregate meminfo collector
    #[arg(long)]
    pub disable_meminfo: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Disable internal scrape_collector_* metrics
    #[arg(long)]
    pub disable_telemetry: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one collection pass per enabled collector and report status
    Check {
        /// Also run the NUMA collector even if disabled in config
        #[arg(long)]
        numa: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run collection passes and print the resulting records
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Print every record, not only the summary
        #[arg(long)]
        verbose: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: RecordFormat,
    },
}
