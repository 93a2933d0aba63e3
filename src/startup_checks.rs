//! Startup requirement validation for herakles-meminfo-exporter.
//!
//! This module validates that the configured memory sources are reachable
//! before the server starts.

use herakles_meminfo_exporter::meminfo::NodeDiscovery;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;

/// Validate all runtime requirements
pub fn validate_requirements(config: &Config) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    if config.meminfo_enabled() && cfg!(target_os = "linux") {
        check_meminfo_access(&config.procfs_path().join("meminfo"))?;
    }

    if config.numa_enabled() {
        check_numa_topology(config.sysfs_path())?;
    }

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check that the meminfo file exists and is readable
fn check_meminfo_access(path: &Path) -> Result<(), ValidationError> {
    match fs::File::open(path) {
        Ok(_) => {
            info!("✅ {} is readable", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!("❌ {} not found - is procfs mounted?", path.display());
            error!("   Solution: pass --procfs <mount point> when running in a container");
            Err(ValidationError::MeminfoMissing(path.display().to_string()))
        }
        Err(e) => {
            error!("❌ Cannot read {}: {}", path.display(), e);
            Err(ValidationError::MeminfoUnreadable(e.to_string()))
        }
    }
}

/// Check that the NUMA node directory exists and lists at least one node
fn check_numa_topology(sysfs: &Path) -> Result<(), ValidationError> {
    let node_root = sysfs.join("devices/system/node");
    if !node_root.is_dir() {
        error!("❌ {} not found - kernel without NUMA support?", node_root.display());
        return Err(ValidationError::NumaUnavailable(node_root.display().to_string()));
    }

    match NodeDiscovery::new(sysfs).discover() {
        Ok(nodes) if nodes.is_empty() => {
            warn!("⚠️  No NUMA nodes found under {}", node_root.display());
        }
        Ok(nodes) => info!("✅ {} NUMA node(s) found", nodes.len()),
        Err(e) => warn!("⚠️  Could not list NUMA nodes: {}", e),
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("meminfo not found at {0}")]
    MeminfoMissing(String),

    #[error("meminfo not readable: {0}")]
    MeminfoUnreadable(String),

    #[error("NUMA node directory not found at {0}")]
    NumaUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir, numa: bool) -> Config {
        Config {
            procfs_path: Some(dir.path().join("proc")),
            sysfs_path: Some(dir.path().join("sys")),
            enable_meminfo_numa: Some(numa),
            ..Config::default()
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_missing_meminfo_rejected() {
        let dir = TempDir::new().unwrap();
        let err = validate_requirements(&config_for(&dir, false)).unwrap_err();
        assert!(matches!(err, ValidationError::MeminfoMissing(_)));
    }

    #[test]
    fn test_missing_node_dir_rejected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("proc")).unwrap();
        fs::write(dir.path().join("proc/meminfo"), "MemTotal: 1 kB\n").unwrap();

        let cfg = config_for(&dir, true);
        let err = validate_requirements(&cfg).unwrap_err();
        assert!(matches!(err, ValidationError::NumaUnavailable(_)));

        fs::create_dir_all(dir.path().join("sys/devices/system/node/node0")).unwrap();
        assert!(validate_requirements(&cfg).is_ok());
    }
}
