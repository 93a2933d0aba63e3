//! Memory statistics collection.
//!
//! This module turns raw OS memory sources into [`MetricRecord`]s:
//! - `/proc/meminfo` (line format, Linux)
//! - `/sys/devices/system/node/node*/{meminfo,numastat}` (NUMA, Linux)
//! - Mach VM statistics and sysctls (macOS)
//!
//! Nothing here keeps state between passes except compiled regexes.

pub mod canonical;
pub mod error;
pub mod numa;
pub mod parser;
pub mod platform;
pub mod record;

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub use canonical::KeyCanonicalizer;
pub use error::{MeminfoError, Result};
pub use numa::{parse_numastat, NodeDiscovery, NodeMeminfoParser, NumaCollector};
pub use parser::MeminfoParser;
pub use platform::{aggregate, NativeMemoryQuery, SwapUsage, VmStatistics};
pub use record::{MetricKind, MetricRecord};

/// Subsystem of the aggregate memory family.
pub const MEMINFO_SUBSYSTEM: &str = "memory";

/// Subsystem of the per-NUMA-node family.
pub const MEMINFO_NUMA_SUBSYSTEM: &str = "memory_numa";

/// Platform-specific source of the aggregate memory map.
pub trait MemInfoSource: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Canonical key -> value for one pass.
    fn mem_info(&self) -> Result<HashMap<String, f64>>;
}

/// Reads `<procfs>/meminfo`.
#[derive(Debug, Clone)]
pub struct ProcMeminfoSource {
    path: PathBuf,
    parser: MeminfoParser,
}

impl ProcMeminfoSource {
    pub fn new(procfs: impl AsRef<Path>) -> Self {
        Self {
            path: procfs.as_ref().join("meminfo"),
            parser: MeminfoParser::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MemInfoSource for ProcMeminfoSource {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn mem_info(&self) -> Result<HashMap<String, f64>> {
        let file = File::open(&self.path).map_err(|e| MeminfoError::io(&self.path, e))?;
        self.parser
            .parse(BufReader::new(file), &self.path.to_string_lossy())
    }
}

/// Builds the map from native queries instead of text.
#[derive(Debug, Clone, Default)]
pub struct NativeMemInfoSource<Q> {
    query: Q,
}

impl<Q: NativeMemoryQuery> NativeMemInfoSource<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }
}

impl<Q: NativeMemoryQuery + Send> MemInfoSource for NativeMemInfoSource<Q> {
    fn name(&self) -> &'static str {
        "native"
    }

    fn mem_info(&self) -> Result<HashMap<String, f64>> {
        aggregate(&self.query)
    }
}

/// The source matching the build target.
#[cfg(target_os = "macos")]
pub fn platform_source(_procfs: &Path) -> Box<dyn MemInfoSource> {
    Box::new(NativeMemInfoSource::new(platform::MachMemoryQuery))
}

/// The source matching the build target.
#[cfg(not(target_os = "macos"))]
pub fn platform_source(procfs: &Path) -> Box<dyn MemInfoSource> {
    Box::new(ProcMeminfoSource::new(procfs))
}

/// Turns the aggregate map into records, sorted by name. Kind comes from the
/// name alone.
pub fn assemble_meminfo(mem_info: HashMap<String, f64>) -> Vec<MetricRecord> {
    let mut records: Vec<MetricRecord> = mem_info
        .into_iter()
        .map(|(name, value)| MetricRecord::from_name(name, value))
        .collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));
    records
}
