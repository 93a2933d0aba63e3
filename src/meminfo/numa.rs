//! Per-NUMA-node memory statistics.
//!
//! Every node directory under `<sysfs>/devices/system/node/` carries two
//! files:
//! - `meminfo`:  `Node <id> Key: value[ kB]`
//! - `numastat`: `name value`
//!
//! Node meminfo lines always become gauges, numastat lines always become
//! counters with a `_total` suffix.

use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::canonical::KeyCanonicalizer;
use super::error::{MeminfoError, Result};
use super::parser::KB;
use super::record::{MetricRecord, COUNTER_SUFFIX};

/// Glob, relative to the sysfs root, listing node directories.
pub const NODE_GLOB: &str = "devices/system/node/node[0-9]*";

/// Extracts the numeric id from a discovered node directory.
const NODE_ID_PATTERN: &str = r"devices/system/node/node([0-9]+)$";

/// Parser for a node's `meminfo` file.
#[derive(Debug, Clone, Default)]
pub struct NodeMeminfoParser {
    canonicalizer: KeyCanonicalizer,
}

impl NodeMeminfoParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// One gauge per non-blank line. The node label is taken verbatim from
    /// the second column.
    pub fn parse<R: BufRead>(&self, reader: R, source_name: &str) -> Result<Vec<MetricRecord>> {
        let mut mem_info = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|e| MeminfoError::io(source_name, e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(MeminfoError::invalid_line(source_name, line));
            }

            let mut value = parts[3]
                .parse::<f64>()
                .map_err(|_| MeminfoError::invalid_value(source_name, parts[3]))?;

            let mut key = self.canonicalizer.canonicalize(parts[2]);

            match parts.len() {
                4 => {}
                5 if parts[4] == "kB" => {
                    value *= KB;
                    key.push_str("_bytes");
                }
                _ => return Err(MeminfoError::invalid_line(source_name, line)),
            }

            mem_info.push(MetricRecord::gauge(key, value, parts[1]));
        }

        Ok(mem_info)
    }
}

/// Parses a node's `numastat` file. Every line becomes a counter named
/// `<name>_total` labelled with `node_id`.
pub fn parse_numastat<R: BufRead>(
    reader: R,
    node_id: &str,
    source_name: &str,
) -> Result<Vec<MetricRecord>> {
    let mut numa_stat = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| MeminfoError::io(source_name, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(MeminfoError::invalid_line(source_name, line));
        }

        let value = parts[1]
            .parse::<f64>()
            .map_err(|_| MeminfoError::invalid_value(source_name, parts[1]))?;

        numa_stat.push(MetricRecord::counter(
            format!("{}{}", parts[0], COUNTER_SUFFIX),
            value,
            node_id,
        ));
    }

    Ok(numa_stat)
}

/// Finds node directories and maps each one to its numeric id.
#[derive(Debug, Clone)]
pub struct NodeDiscovery {
    sysfs: PathBuf,
    node_re: Regex,
}

impl NodeDiscovery {
    pub fn new(sysfs: impl Into<PathBuf>) -> Self {
        Self {
            sysfs: sysfs.into(),
            node_re: Regex::new(NODE_ID_PATTERN).expect("node id pattern is valid"),
        }
    }

    /// Full glob pattern, rooted at the configured sysfs path.
    pub fn pattern(&self) -> String {
        self.sysfs.join(NODE_GLOB).to_string_lossy().into_owned()
    }

    /// Node directories matching [`NODE_GLOB`], in glob order.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.pattern();
        let paths = glob::glob(&pattern).map_err(|e| MeminfoError::Glob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        let mut nodes = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => nodes.push(path),
                Err(e) => {
                    let path = e.path().to_path_buf();
                    return Err(MeminfoError::io(path, e.into_error()));
                }
            }
        }
        Ok(nodes)
    }

    /// Numeric node id from a node directory path. A path that the glob
    /// accepted but the regex rejects is an error, never skipped.
    pub fn node_id(&self, node: &Path) -> Result<String> {
        let path = node.to_string_lossy();
        self.node_re
            .captures(&path)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| MeminfoError::NodePathMismatch(path.into_owned()))
    }
}

/// One NUMA collection pass over every node.
#[derive(Debug, Clone)]
pub struct NumaCollector {
    discovery: NodeDiscovery,
    parser: NodeMeminfoParser,
}

impl NumaCollector {
    pub fn new(sysfs: impl Into<PathBuf>) -> Self {
        Self {
            discovery: NodeDiscovery::new(sysfs),
            parser: NodeMeminfoParser::new(),
        }
    }

    pub fn discovery(&self) -> &NodeDiscovery {
        &self.discovery
    }

    /// Reads `meminfo` and `numastat` for every discovered node.
    ///
    /// Opened files are kept until the pass returns, whether it succeeds or
    /// not; any failure discards all records gathered so far.
    pub fn collect(&self) -> Result<Vec<MetricRecord>> {
        let nodes = self.discovery.discover()?;
        debug!("Discovered {} NUMA node(s)", nodes.len());

        let mut open_files: Vec<File> = Vec::with_capacity(nodes.len() * 2);
        let mut metrics = Vec::new();

        for node in &nodes {
            let meminfo_path = node.join("meminfo");
            let meminfo = open(&meminfo_path)?;
            let node_info = self
                .parser
                .parse(BufReader::new(&meminfo), &meminfo_path.to_string_lossy())?;
            open_files.push(meminfo);
            metrics.extend(node_info);

            let numastat_path = node.join("numastat");
            let numastat = open(&numastat_path)?;
            let node_id = self.discovery.node_id(node)?;
            let node_stat = parse_numastat(
                BufReader::new(&numastat),
                &node_id,
                &numastat_path.to_string_lossy(),
            )?;
            open_files.push(numastat);
            trace!("Node {}: {} counters", node_id, node_stat.len());
            metrics.extend(node_stat);
        }

        Ok(metrics)
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| MeminfoError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meminfo::MetricKind;
    use std::io::Cursor;

    #[test]
    fn test_node_meminfo_line_with_unit() {
        let records = NodeMeminfoParser::new()
            .parse(Cursor::new("Node 0 MemFree: 500 kB\n"), "node0/meminfo")
            .unwrap();
        assert_eq!(records, vec![MetricRecord::gauge("MemFree_bytes", 512_000.0, "0")]);
    }

    #[test]
    fn test_node_meminfo_line_without_unit() {
        let records = NodeMeminfoParser::new()
            .parse(
                Cursor::new("  Node 1 HugePages_Total:     0\n\n"),
                "node1/meminfo",
            )
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "HugePages_Total");
        assert_eq!(records[0].node, "1");
        assert_eq!(records[0].value, 0.0);
    }

    #[test]
    fn test_node_meminfo_total_suffix_stays_gauge() {
        let records = NodeMeminfoParser::new()
            .parse(Cursor::new("Node 0 Weird_total: 5\n"), "meminfo")
            .unwrap();
        assert_eq!(records[0].kind(), MetricKind::Gauge);
    }

    #[test]
    fn test_node_meminfo_parenthesized_key() {
        let records = NodeMeminfoParser::new()
            .parse(Cursor::new("Node 0 Active(anon): 4 kB\n"), "meminfo")
            .unwrap();
        assert_eq!(records[0].name, "Active_anon_bytes");
        assert_eq!(records[0].value, 4096.0);
    }

    #[test]
    fn test_node_meminfo_only_one_colon_removed() {
        let records = NodeMeminfoParser::new()
            .parse(Cursor::new("Node 0 Odd:: 5\n"), "meminfo")
            .unwrap();
        assert_eq!(records[0].name, "Odd:");
    }

    #[test]
    fn test_node_meminfo_unknown_unit_rejected() {
        let err = NodeMeminfoParser::new()
            .parse(Cursor::new("Node 0 MemFree: 500 MB\n"), "meminfo")
            .unwrap_err();
        assert!(matches!(err, MeminfoError::InvalidLine { .. }));
    }

    #[test]
    fn test_node_meminfo_bad_value_rejected() {
        let err = NodeMeminfoParser::new()
            .parse(Cursor::new("Node 0 MemFree: x kB\n"), "meminfo")
            .unwrap_err();
        assert!(matches!(err, MeminfoError::InvalidValue { .. }));
    }

    #[test]
    fn test_node_meminfo_short_line_rejected() {
        let err = NodeMeminfoParser::new()
            .parse(Cursor::new("Node 0\n"), "meminfo")
            .unwrap_err();
        assert!(matches!(err, MeminfoError::InvalidLine { .. }));
    }

    #[test]
    fn test_numastat_line() {
        let records = parse_numastat(Cursor::new("numa_hit 42\n"), "1", "numastat").unwrap();
        assert_eq!(records, vec![MetricRecord::counter("numa_hit_total", 42.0, "1")]);
    }

    #[test]
    fn test_numastat_wrong_field_count() {
        let err = parse_numastat(Cursor::new("numa_hit 42 7\n"), "0", "numastat").unwrap_err();
        match err {
            MeminfoError::InvalidLine { line, .. } => assert_eq!(line, "numa_hit 42 7"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_numastat_bad_value() {
        let err = parse_numastat(Cursor::new("numa_hit many\n"), "0", "numastat").unwrap_err();
        assert!(matches!(err, MeminfoError::InvalidValue { .. }));
    }

    #[test]
    fn test_node_id_extraction() {
        let discovery = NodeDiscovery::new("/sys");
        assert_eq!(
            discovery
                .node_id(Path::new("/sys/devices/system/node/node12"))
                .unwrap(),
            "12"
        );
    }

    #[test]
    fn test_node_id_mismatch_is_fatal() {
        let discovery = NodeDiscovery::new("/sys");
        for bad in [
            "/sys/devices/system/node/node1a",
            "/sys/devices/system/node/nodeX",
            "/sys/devices/system/cpu/cpu0",
        ] {
            match discovery.node_id(Path::new(bad)) {
                Err(MeminfoError::NodePathMismatch(path)) => assert_eq!(path, bad),
                other => panic!("expected mismatch for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_pattern_is_rooted_at_sysfs() {
        let discovery = NodeDiscovery::new("/host/sys");
        assert_eq!(discovery.pattern(), "/host/sys/devices/system/node/node[0-9]*");
    }
}
