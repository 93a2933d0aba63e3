//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("herakles-meminfo-exporter.yaml"));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Meminfo Exporter Configuration
# ========================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
#
# Metric Naming
# -------------
# namespace: "node"            # Prefix, e.g. node_memory_MemTotal_bytes
#
# Source Locations
# ----------------
# procfs_path: "/proc"         # procfs mount point (/host/proc in containers)
# sysfs_path: "/sys"           # sysfs mount point (/host/sys in containers)
#
# Collector Enable Flags
# ----------------------
# enable_meminfo: true         # node_memory_* from /proc/meminfo (or Mach on macOS)
# enable_meminfo_numa: false   # node_memory_numa_* per NUMA node (Linux only)
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: true       # Enable scrape_collector_* metrics
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commented_yaml_still_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.yaml");
        command_config(Some(path.clone()), ConfigFormat::Yaml, true).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Herakles Meminfo Exporter Configuration"));
        let parsed: Config = serde_yaml::from_str(&content).unwrap();
        assert_eq!(parsed.port, Some(9216));
    }
}
