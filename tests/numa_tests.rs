//! Integration tests for the NUMA collector.
//!
//! Each test lays out `devices/system/node/node*` under a temporary sysfs
//! root and runs a full collection pass over it.

use herakles_meminfo_exporter::meminfo::{MeminfoError, MetricKind, MetricRecord, NumaCollector};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn add_node(sysfs: &Path, dir_name: &str, meminfo: Option<&str>, numastat: Option<&str>) {
    let node = sysfs.join("devices/system/node").join(dir_name);
    fs::create_dir_all(&node).unwrap();
    if let Some(content) = meminfo {
        fs::write(node.join("meminfo"), content).unwrap();
    }
    if let Some(content) = numastat {
        fs::write(node.join("numastat"), content).unwrap();
    }
}

fn find<'a>(records: &'a [MetricRecord], name: &str, node: &str) -> &'a MetricRecord {
    records
        .iter()
        .find(|r| r.name == name && r.node == node)
        .unwrap_or_else(|| panic!("missing {name}{{node={node}}}"))
}

#[test]
fn test_two_node_pass() {
    let sysfs = TempDir::new().unwrap();
    add_node(
        sysfs.path(),
        "node0",
        Some("Node 0 MemTotal:  1000 kB\nNode 0 MemFree:   500 kB\nNode 0 HugePages_Total:     0\n"),
        Some("numa_hit 100\nnuma_miss 2\n"),
    );
    add_node(
        sysfs.path(),
        "node1",
        Some("\nNode 1 MemTotal:  2000 kB\n"),
        Some("numa_hit 7\n"),
    );

    let records = NumaCollector::new(sysfs.path()).collect().unwrap();
    assert_eq!(records.len(), 8);

    let free = find(&records, "MemFree_bytes", "0");
    assert_eq!(free.value, 512_000.0);
    assert_eq!(free.kind(), MetricKind::Gauge);

    assert_eq!(find(&records, "MemTotal_bytes", "1").value, 2_048_000.0);
    assert_eq!(find(&records, "HugePages_Total", "0").value, 0.0);

    let hit = find(&records, "numa_hit_total", "1");
    assert_eq!(hit.value, 7.0);
    assert_eq!(hit.kind(), MetricKind::Counter);

    assert!(records.iter().all(|r| r.is_node_scoped()));
}

#[test]
fn test_no_nodes_is_empty_success() {
    let sysfs = TempDir::new().unwrap();
    let records = NumaCollector::new(sysfs.path()).collect().unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_missing_numastat_fails_pass() {
    let sysfs = TempDir::new().unwrap();
    add_node(sysfs.path(), "node0", Some("Node 0 MemFree: 1 kB\n"), None);

    let err = NumaCollector::new(sysfs.path()).collect().unwrap_err();
    match err {
        MeminfoError::Io { path, .. } => assert!(path.ends_with("node0/numastat")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_directory_rejected_by_node_pattern_is_fatal() {
    let sysfs = TempDir::new().unwrap();
    add_node(sysfs.path(), "node0", Some("Node 0 MemFree: 1 kB\n"), Some("numa_hit 1\n"));
    add_node(sysfs.path(), "node1x", Some("Node 1 MemFree: 1 kB\n"), Some("numa_hit 1\n"));

    let err = NumaCollector::new(sysfs.path()).collect().unwrap_err();
    match err {
        MeminfoError::NodePathMismatch(path) => assert!(path.ends_with("node1x")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_node_line_discards_earlier_nodes() {
    let sysfs = TempDir::new().unwrap();
    add_node(sysfs.path(), "node0", Some("Node 0 MemFree: 1 kB\n"), Some("numa_hit 1\n"));
    add_node(sysfs.path(), "node1", Some("Node 1 MemFree: 1 MB\n"), Some("numa_hit 1\n"));

    let err = NumaCollector::new(sysfs.path()).collect().unwrap_err();
    assert!(matches!(err, MeminfoError::InvalidLine { .. }));
}

#[test]
fn test_node_label_comes_from_content_for_meminfo() {
    let sysfs = TempDir::new().unwrap();
    // The meminfo label is read from the line, the numastat label from the path.
    add_node(sysfs.path(), "node3", Some("Node 9 MemFree: 1 kB\n"), Some("numa_hit 1\n"));

    let records = NumaCollector::new(sysfs.path()).collect().unwrap();
    assert_eq!(find(&records, "MemFree_bytes", "9").value, 1024.0);
    assert_eq!(find(&records, "numa_hit_total", "3").value, 1.0);
}
