//! Integration tests for the aggregate meminfo source.
//!
//! These tests build a fake procfs tree in a temporary directory and read
//! it through `ProcMeminfoSource`, the way the exporter does on Linux.

use herakles_meminfo_exporter::meminfo::{
    assemble_meminfo, MemInfoSource, MeminfoError, MetricKind, ProcMeminfoSource,
};
use std::fs;
use tempfile::TempDir;

const SAMPLE: &str = "MemTotal:       16307872 kB
MemFree:         1006004 kB
MemAvailable:    9385928 kB
Buffers:          574692 kB
Cached:          8013568 kB
Active(anon):    3321780 kB
Inactive(file):  3604260 kB
HugePages_Total:       0
HugePages_Free:        0
Hugepagesize:       2048 kB
";

fn procfs_with(content: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("meminfo"), content).unwrap();
    dir
}

#[test]
fn test_reads_sample_meminfo() {
    let dir = procfs_with(SAMPLE);
    let source = ProcMeminfoSource::new(dir.path());
    assert_eq!(source.path(), dir.path().join("meminfo"));

    let info = source.mem_info().unwrap();
    assert_eq!(info.len(), 10);
    assert_eq!(info["MemTotal_bytes"], 16307872.0 * 1024.0);
    assert_eq!(info["Active_anon_bytes"], 3321780.0 * 1024.0);
    assert_eq!(info["Inactive_file_bytes"], 3604260.0 * 1024.0);
    assert_eq!(info["HugePages_Total"], 0.0);
    assert_eq!(info["Hugepagesize_bytes"], 2048.0 * 1024.0);
    assert!(!info.contains_key("MemTotal"));
}

#[test]
fn test_assembled_records_are_gauges_without_node() {
    let dir = procfs_with(SAMPLE);
    let records = assemble_meminfo(ProcMeminfoSource::new(dir.path()).mem_info().unwrap());

    assert_eq!(records.len(), 10);
    for record in &records {
        assert_eq!(record.kind(), MetricKind::Gauge, "{}", record.name);
        assert!(record.node.is_empty());
    }
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[test]
fn test_total_suffix_becomes_counter() {
    let dir = procfs_with("Pgfault_total: 42\nMemFree: 1 kB\n");
    let records = assemble_meminfo(ProcMeminfoSource::new(dir.path()).mem_info().unwrap());

    let counter = records.iter().find(|r| r.name == "Pgfault_total").unwrap();
    assert_eq!(counter.kind(), MetricKind::Counter);
    assert_eq!(counter.value, 42.0);
}

#[test]
fn test_blank_lines_and_duplicates() {
    let dir = procfs_with("\nMemFree: 1 kB\n\n\nMemFree: 2 kB\n");
    let info = ProcMeminfoSource::new(dir.path()).mem_info().unwrap();
    assert_eq!(info.len(), 1);
    assert_eq!(info["MemFree_bytes"], 2048.0);
}

#[test]
fn test_malformed_line_fails_whole_pass() {
    let dir = procfs_with("MemTotal: 100 kB\nMemFree: lots kB\nCached: 5 kB\n");
    let err = ProcMeminfoSource::new(dir.path()).mem_info().unwrap_err();
    match err {
        MeminfoError::InvalidValue { value, .. } => assert_eq!(value, "lots"),
        other => panic!("unexpected error: {other}"),
    }

    let dir = procfs_with("MemTotal: 100 kB extra\n");
    let err = ProcMeminfoSource::new(dir.path()).mem_info().unwrap_err();
    assert!(matches!(err, MeminfoError::InvalidLine { .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ProcMeminfoSource::new(dir.path()).mem_info().unwrap_err();
    match err {
        MeminfoError::Io { path, .. } => assert_eq!(path, dir.path().join("meminfo")),
        other => panic!("unexpected error: {other}"),
    }
}
