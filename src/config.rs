//! Configuration management for herakles-meminfo-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;
use tracing::level_filters::LevelFilter;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_NAMESPACE: &str = "node";
pub const DEFAULT_PROCFS_PATH: &str = "/proc";
pub const DEFAULT_SYSFS_PATH: &str = "/sys";

/// Exporter configuration. Every field is optional; unset fields fall back
/// to the defaults above.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Metric naming
    pub namespace: Option<String>,

    // Source locations
    #[serde(alias = "procfs-path")]
    pub procfs_path: Option<PathBuf>,
    #[serde(alias = "sysfs-path")]
    pub sysfs_path: Option<PathBuf>,

    // Collector enable flags
    #[serde(alias = "enable-meminfo")]
    pub enable_meminfo: Option<bool>,
    #[serde(alias = "enable-meminfo-numa")]
    pub enable_meminfo_numa: Option<bool>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,
    #[serde(alias = "enable-telemetry")]
    pub enable_telemetry: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            namespace: Some(DEFAULT_NAMESPACE.to_string()),
            procfs_path: Some(PathBuf::from(DEFAULT_PROCFS_PATH)),
            sysfs_path: Some(PathBuf::from(DEFAULT_SYSFS_PATH)),
            enable_meminfo: Some(true),
            enable_meminfo_numa: Some(false),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn procfs_path(&self) -> &Path {
        self.procfs_path
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_PROCFS_PATH))
    }

    pub fn sysfs_path(&self) -> &Path {
        self.sysfs_path
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_SYSFS_PATH))
    }

    pub fn meminfo_enabled(&self) -> bool {
        self.enable_meminfo.unwrap_or(true)
    }

    pub fn numa_enabled(&self) -> bool {
        self.enable_meminfo_numa.unwrap_or(false)
    }

    /// Effective log filter, `None` if `log_level` is not a known level.
    pub fn log_filter(&self) -> Option<LevelFilter> {
        LevelFilter::from_str(self.log_level.as_deref().unwrap_or("info")).ok()
    }
}

/// True for `[a-zA-Z_][a-zA-Z0-9_]*`.
fn is_valid_name_fragment(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if !(cfg.meminfo_enabled() || cfg.numa_enabled()) {
        return Err("At least one of enable_meminfo/enable_meminfo_numa must be true".into());
    }

    let namespace = cfg.namespace();
    if !is_valid_name_fragment(namespace) {
        return Err(format!(
            "Invalid namespace '{}', expected [a-zA-Z_][a-zA-Z0-9_]*",
            namespace
        )
        .into());
    }

    if cfg.procfs_path().as_os_str().is_empty() {
        return Err("procfs_path must not be empty".into());
    }
    if cfg.sysfs_path().as_os_str().is_empty() {
        return Err("sysfs_path must not be empty".into());
    }

    if cfg.log_filter().is_none() {
        return Err(format!(
            "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
            cfg.log_level.as_deref().unwrap_or_default()
        )
        .into());
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref().and_then(|p| p.to_str()))?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(namespace) = &args.namespace {
        config.namespace = Some(namespace.clone());
    }

    if let Some(procfs) = &args.procfs {
        config.procfs_path = Some(procfs.clone());
    }
    if let Some(sysfs) = &args.sysfs {
        config.sysfs_path = Some(sysfs.clone());
    }

    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    // Collector flags
    if args.enable_numa {
        config.enable_meminfo_numa = Some(true);
    }
    if args.disable_meminfo {
        config.enable_meminfo = Some(false);
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/herakles/meminfo-exporter.yaml",
            "/etc/herakles/meminfo-exporter.yml",
            "/etc/herakles/meminfo-exporter.json",
            "./herakles-meminfo-exporter.yaml",
            "./herakles-meminfo-exporter.yml",
            "./herakles-meminfo-exporter.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(""))
    };

    if !path.exists() || path.to_string_lossy().is_empty() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;
    parse_config(&path, &content)
}

/// Parses config content, choosing the format by file extension.
fn parse_config(path: &Path, content: &str) -> Result<Config, Box<dyn std::error::Error>> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Serializes the configuration in the requested format.
pub fn render_config(config: &Config, format: &ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let output = render_config(config, &format)?;
    println!("{output}");
    Ok(())
}
