//! Herakles Memory Info Exporter Library
//!
//! This library extracts operating-system memory statistics and normalizes
//! them into a uniform set of named, typed records ready for export as
//! Prometheus metrics.
//!
//! # Sources
//!
//! - **`/proc/meminfo`**: `Key: value[ kB]` lines, kB values converted to bytes
//! - **NUMA nodes**: `/sys/devices/system/node/node*/meminfo` and `numastat`
//! - **macOS**: Mach VM statistics, `hw.memsize` and `vm.swapusage`
//!
//! # Usage
//!
//! ```rust
//! use std::io::Cursor;
//! use herakles_meminfo_exporter::meminfo::{assemble_meminfo, MeminfoParser, MetricKind};
//!
//! let parser = MeminfoParser::new();
//! let info = parser
//!     .parse(Cursor::new("MemTotal: 1234 kB\nActive(anon): 8 kB\n"), "meminfo")
//!     .unwrap();
//!
//! for record in assemble_meminfo(info) {
//!     assert_eq!(record.kind(), MetricKind::Gauge);
//!     println!("{} = {}", record.name, record.value);
//! }
//! ```

pub mod health_stats;
pub mod meminfo;

// Re-export main types for convenience
pub use health_stats::HealthStats;
pub use meminfo::{MeminfoError, MetricKind, MetricRecord};
