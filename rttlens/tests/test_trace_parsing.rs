//! Integration tests for reading trace files into session records

use rttlens::analysis::DropReason;
use rttlens::domain::{Direction, StageTransition};
use rttlens::trace_data::{RecordContext, TraceFile};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn ctx(direction: Direction, source_file: &str) -> RecordContext<'_> {
    RecordContext {
        direction,
        source_file,
        pair_name: "node1-node2",
        src_ip: "10.0.0.1",
        dst_ip: "10.0.0.2",
    }
}

#[test]
fn test_parse_trace_outgoing_fixture() {
    let trace = TraceFile::from_file(
        fixture("node1_outgoing.log"),
        &ctx(Direction::Outgoing, "node1_outgoing.log"),
    )
    .unwrap();

    assert_eq!(trace.blocks, 4);
    assert_eq!(trace.skipped, 1);
    assert_eq!(trace.records.len(), 3);

    let seqs: Vec<u64> = trace.records.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);

    let first = &trace.records[0];
    assert_eq!(first.timestamp, "2025-03-14 09:26:53.589793");
    assert_eq!(first.session_src_ip, "10.0.0.1");
    assert_eq!(first.session_dst_ip, "10.0.0.2");
    assert_eq!(first.session_id, 100);
    assert_eq!(first.direction, Direction::Outgoing);
    assert_eq!(first.source_file, "node1_outgoing.log");
    assert_eq!(first.stage_pointers.len(), 3);
    assert!(!first.is_drop());
    assert_eq!(first.max_stage.as_deref(), Some("Path1_1->2"));
    assert!((first.max_latency - 250.0).abs() < f64::EPSILON);
    assert_eq!(first.total_rtt, Some(400.0));
}

#[test]
fn test_parse_trace_drop_excludes_corrupted_stage() {
    let trace = TraceFile::from_file(
        fixture("node1_outgoing.log"),
        &ctx(Direction::Outgoing, "node1_outgoing.log"),
    )
    .unwrap();

    let dropped = &trace.records[1];
    assert!(dropped.is_drop());
    assert_eq!(dropped.loss.reason, Some(DropReason::Stage1To2Mismatch));
    assert_eq!(dropped.loss.corrupted_stages, vec![StageTransition::new(1, 2)]);

    // 900 us on the corrupted 1->2 hop never wins
    assert_eq!(dropped.path1_latencies.get(&StageTransition::new(1, 2)), Some(900.0));
    assert_eq!(dropped.max_stage.as_deref(), Some("Path2_3->4"));
    assert!((dropped.max_latency - 50.0).abs() < f64::EPSILON);
    assert_eq!(dropped.total_rtt, None);
}

#[test]
fn test_parse_trace_incoming_unmeasured_hop() {
    let trace = TraceFile::from_file(
        fixture("node2_incoming.log"),
        &ctx(Direction::Incoming, "node2_incoming.log"),
    )
    .unwrap();

    assert_eq!(trace.skipped, 0);
    let last = trace.records.last().unwrap();
    assert_eq!(last.seq, 9);
    assert_eq!(last.path1_latencies.len(), 1);
    assert!(!last.path1_latencies.contains(&StageTransition::new(1, 2)));
    // Only two pointer snapshots: not enough to judge loss
    assert!(!last.is_drop());
}

#[test]
fn test_parse_trace_tolerates_invalid_utf8() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"=== ICMP RTT Trace: 2025-03-14 09:26:53.589793 ===\n").unwrap();
    file.write_all(b"Session: 10.0.0.1 (n\xff1) -> 10.0.0.2 (node2) (ID: 5, Seq: 6)\n").unwrap();
    file.write_all(b"Path 1 Latencies (us):\n  [0->1] a -> b: 7.5 us\n").unwrap();

    let trace = TraceFile::from_file(file.path(), &ctx(Direction::Outgoing, "bad.log")).unwrap();

    assert_eq!(trace.records.len(), 1);
    assert_eq!(trace.records[0].session_id, 5);
    assert_eq!(trace.records[0].max_stage.as_deref(), Some("Path1_0->1"));
}

#[test]
fn test_parse_trace_without_markers() {
    let trace = TraceFile::parse("no blocks here\njust noise\n", &ctx(Direction::Incoming, "x.log"));
    assert_eq!(trace.blocks, 0);
    assert_eq!(trace.skipped, 0);
    assert!(trace.records.is_empty());
}

#[test]
fn test_parse_trace_missing_file_is_io_error() {
    let result = TraceFile::from_file("/nonexistent/trace.log", &ctx(Direction::Outgoing, "trace.log"));
    assert!(result.is_err());
}
