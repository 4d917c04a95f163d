//! Report files: field names on disk and re-summarizing a saved report

use rttlens::analysis::summarize;
use rttlens::config::AnalysisConfig;
use rttlens::export::{
    analysis_file_path, load_analysis, save_analysis, save_summary, summary_file_path,
    summary_path_for,
};
use rttlens::pipeline::AnalysisPipeline;
use serde_json::Value;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Fixture config with trace paths made absolute.
fn fixture_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::load_from_file(fixture("pairs.json")).unwrap();
    for pair in &mut config.node_pairs {
        pair.outgoing_file = pair.outgoing_file.as_ref().map(|p| fixture(&p.to_string_lossy()));
        pair.incoming_file = pair.incoming_file.as_ref().map(|p| fixture(&p.to_string_lossy()));
    }
    config
}

fn run_fixture() -> rttlens::analysis::AnalysisReport {
    let pipeline = AnalysisPipeline::new(fixture_config());
    let loads = pipeline.load_all().into_iter().map(Result::unwrap).collect();
    pipeline.analyze(loads).report
}

#[test]
fn test_fixture_config() {
    let config = fixture_config();
    assert_eq!(config.name, "fixture_run");
    assert!((config.processing_delay_us - 60.0).abs() < f64::EPSILON);
    assert!(config.node_pairs[0].outgoing_file.as_ref().unwrap().exists());
}

#[test]
fn test_analysis_json_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_fixture();
    let path = analysis_file_path(dir.path(), "fixture_run");
    save_analysis(&report, &path).unwrap();

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let analysis = &json["analysis"];
    for field in [
        "node_pairs",
        "timestamp",
        "total_sessions",
        "matched_sessions",
        "outgoing_only",
        "incoming_only",
        "valid_sessions",
        "dropped_sessions",
    ] {
        assert!(analysis.get(field).is_some(), "missing field {field}");
    }

    let both = &analysis["valid_sessions"][0];
    assert_eq!(both["session_type"], "bidirectional");
    assert_eq!(both["session_key"], "node1-node2_100_1");
    assert_eq!(both["is_bidirectional"], true);
    assert_eq!(both["outgoing_path1_latencies"]["1->2"], 250.0);
    assert_eq!(both["fping_processing_delay"], 60.0);

    let dropped = &analysis["dropped_sessions"][0];
    assert_eq!(dropped["drop"], true);
    assert_eq!(dropped["drop_details"][0], "OUTGOING_Stage_1_to_2_SKB_Mismatch");

    let one_sided = analysis["valid_sessions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["session_type"] == "unidirectional")
        .unwrap();
    assert_eq!(one_sided["direction_type"], "OUTGOING");
    assert_eq!(one_sided["available_direction"], "OUTGOING");
    assert_eq!(one_sided["direction"], "10.0.0.1->10.0.0.2");
}

#[test]
fn test_saved_report_summarizes_identically() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_fixture();
    let path = analysis_file_path(dir.path(), "fixture_run");
    save_analysis(&report, &path).unwrap();

    let reloaded = load_analysis(&path).unwrap();
    assert_eq!(reloaded, report);
    assert_eq!(summarize(&reloaded.analysis), summarize(&report.analysis));
}

#[test]
fn test_summary_contents() {
    let summary = summarize(&run_fixture().analysis);

    let overall = &summary.overall_analysis;
    assert_eq!(overall.total_valid_sessions, 3);
    assert_eq!(overall.sessions_with_latency, 3);
    assert_eq!(overall.latency_distribution["0-10ms"], 2);
    assert_eq!(overall.latency_distribution["10-100ms"], 1);
    assert_eq!(overall.stage_distribution["Path1_0->1"], 1);

    let stats = overall.latency_statistics.as_ref().unwrap();
    assert!((stats.mean - 4115.0).abs() < 1e-9);
    assert!((stats.median - 340.0).abs() < f64::EPSILON);
    assert!((stats.max - 12_000.0).abs() < f64::EPSILON);

    let dropped = &summary.dropped_sessions_analysis;
    assert_eq!(dropped.total_dropped_sessions, 1);
    assert_eq!(dropped.stage_distribution["OUTGOING_Path2_3->4"], 1);
    assert_eq!(dropped.drop_reason_distribution["OUTGOING_Stage_1_to_2_SKB_Mismatch"], 1);

    assert_eq!(summary.pair_analysis["node1-node2"].total_sessions, 3);
}

#[test]
fn test_summary_written_into_new_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("reports/today");
    let summary = summarize(&run_fixture().analysis);

    let path = summary_file_path(&nested, "fixture_run");
    save_summary(&summary, &path).unwrap();

    assert!(path.ends_with("fixture_run_latency_summary.json"));
    let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["total_sessions"], 4);
    assert!(json["overall_analysis"]["range_percentages"].is_object());
    assert_eq!(summary_path_for(&analysis_file_path(&nested, "fixture_run")), path);
}
