//! Human-readable run output on stdout.
//!
//! Every printer writes to a `Write` so the layout can be checked in tests;
//! the `print_*` wrappers target stdout.

// Latencies are formatted for display only
#![allow(clippy::cast_precision_loss)]

use crate::analysis::summary::{LatencyRange, LatencyStatistics};
use crate::analysis::{AnalysisBody, GroupMatchStats, LatencySummary};
use crate::pipeline::{FileStatus, PairLoad};
use std::collections::BTreeMap;
use std::io::{self, Write};

const RULE_WIDTH: usize = 100;

/// Format a latency in µs as `x.x us`, `x.x ms` or `x.x s`.
#[must_use]
pub fn format_latency(latency_us: f64) -> String {
    if latency_us < 1_000.0 {
        format!("{latency_us:.1} us")
    } else if latency_us < 1_000_000.0 {
        format!("{:.1} ms", latency_us / 1_000.0)
    } else {
        format!("{:.1} s", latency_us / 1_000_000.0)
    }
}

/// Per-file session and skipped-block counts.
///
/// # Errors
/// Propagates write failures.
pub fn write_load_breakdown<W: Write>(out: &mut W, loads: &[PairLoad]) -> io::Result<()> {
    let mut total = 0;
    for load in loads {
        writeln!(out, "\n{}:", load.pair_name)?;
        for file in &load.files {
            let name = file
                .path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match file.status {
                FileStatus::NotConfigured => {}
                FileStatus::Missing => {
                    writeln!(out, "  {} ({name}): missing", file.direction)?;
                }
                FileStatus::Loaded { sessions, skipped, .. } => {
                    total += sessions;
                    if skipped > 0 {
                        writeln!(
                            out,
                            "  {} ({name}): {sessions} sessions, {skipped} blocks skipped",
                            file.direction
                        )?;
                    } else {
                        writeln!(out, "  {} ({name}): {sessions} sessions", file.direction)?;
                    }
                }
            }
        }
    }
    writeln!(out, "\nloaded {total} sessions from {} node pairs", loads.len())
}

/// Per-group matching counts.
///
/// # Errors
/// Propagates write failures.
pub fn write_match_breakdown<W: Write>(out: &mut W, groups: &[GroupMatchStats]) -> io::Result<()> {
    for group in groups {
        writeln!(
            out,
            "match {}: outgoing={} incoming={} matched={} outgoing_only={} incoming_only={}",
            group.pair_name,
            group.outgoing,
            group.incoming,
            group.matched,
            group.outgoing_only,
            group.incoming_only
        )?;
    }
    Ok(())
}

/// One-paragraph totals of an analysis report.
///
/// # Errors
/// Propagates write failures.
pub fn write_run_totals<W: Write>(out: &mut W, analysis: &AnalysisBody) -> io::Result<()> {
    writeln!(out, "\nanalysis completed:")?;
    writeln!(out, "  total sessions: {}", analysis.total_sessions)?;
    writeln!(out, "  matched pairs: {}", analysis.matched_sessions)?;
    writeln!(out, "  unidirectional sessions: {}", analysis.outgoing_only + analysis.incoming_only)?;
    writeln!(out, "  valid sessions: {}", analysis.valid_sessions.len())?;
    writeln!(out, "  dropped sessions: {}", analysis.dropped_sessions.len())
}

fn write_statistics<W: Write>(out: &mut W, stats: &LatencyStatistics, indent: &str) -> io::Result<()> {
    writeln!(out, "{indent}mean: {}", format_latency(stats.mean))?;
    writeln!(out, "{indent}median: {}", format_latency(stats.median))?;
    writeln!(out, "{indent}min: {}", format_latency(stats.min))?;
    writeln!(out, "{indent}max: {}", format_latency(stats.max))?;
    writeln!(out, "{indent}std: {}", format_latency(stats.std))?;
    writeln!(out, "{indent}p95: {}", format_latency(stats.p95))?;
    writeln!(out, "{indent}p99: {}", format_latency(stats.p99))
}

/// Entries sorted by count, highest first; ties keep key order.
fn by_count(distribution: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut entries: Vec<_> = distribution.iter().map(|(k, &v)| (k.as_str(), v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

fn percent_of(percentages: Option<&BTreeMap<String, f64>>, key: &str) -> f64 {
    percentages.and_then(|p| p.get(key)).copied().unwrap_or(0.0)
}

/// The full latency summary.
///
/// # Errors
/// Propagates write failures.
pub fn write_summary<W: Write>(out: &mut W, summary: &LatencySummary) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);

    writeln!(out, "\n{rule}")?;
    writeln!(out, "ICMP RTT latency summary")?;
    writeln!(out, "node pairs: {}", summary.node_pairs.len())?;
    for pair in &summary.node_pairs {
        writeln!(out, "  - {}: {} -> {}", pair.pair_name, pair.src_ip, pair.dst_ip)?;
    }
    writeln!(out, "total sessions: {}", summary.total_sessions)?;
    writeln!(out, "{rule}")?;

    let overall = &summary.overall_analysis;
    writeln!(out, "\noverall:")?;
    writeln!(out, "  valid sessions: {}", overall.total_valid_sessions)?;
    writeln!(out, "  sessions with latency: {}", overall.sessions_with_latency)?;

    if let Some(stats) = &overall.latency_statistics {
        writeln!(out, "\n  max latency statistics:")?;
        write_statistics(out, stats, "    ")?;
    }

    if !overall.latency_distribution.is_empty() {
        writeln!(out, "\n  latency ranges:")?;
        for range in LatencyRange::ALL {
            let label = range.label();
            if let Some(&count) = overall.latency_distribution.get(label).filter(|&&c| c > 0) {
                let percent = percent_of(overall.range_percentages.as_ref(), label);
                writeln!(out, "    {label}: {count} sessions ({percent:.1}%)")?;
            }
        }
    }

    if !overall.stage_distribution.is_empty() {
        writeln!(out, "\n  max latency stages (>=10ms):")?;
        for (stage, count) in by_count(&overall.stage_distribution) {
            let percent = percent_of(overall.stage_percentages.as_ref(), stage);
            writeln!(out, "    {stage}: {count} sessions ({percent:.1}%)")?;
        }
    }

    writeln!(out, "\nper node pair:")?;
    for (pair_name, pair) in &summary.pair_analysis {
        writeln!(out, "\n  {pair_name}:")?;
        writeln!(out, "    valid sessions: {}", pair.total_sessions)?;
        let stats = &pair.latency_statistics;
        writeln!(out, "    mean: {}", format_latency(stats.mean))?;
        writeln!(out, "    median: {}", format_latency(stats.median))?;
        writeln!(out, "    p95: {}", format_latency(stats.p95))?;
        writeln!(out, "    max: {}", format_latency(stats.max))?;
        writeln!(out, "    ranges:")?;
        for range in LatencyRange::ALL {
            let label = range.label();
            if let Some(&count) = pair.latency_distribution.get(label).filter(|&&c| c > 0) {
                let percent = count as f64 / pair.total_sessions as f64 * 100.0;
                writeln!(out, "      {label}: {count} ({percent:.1}%)")?;
            }
        }
    }

    let dropped = &summary.dropped_sessions_analysis;
    if dropped.total_dropped_sessions > 0 {
        writeln!(out, "\ndropped sessions: {}", dropped.total_dropped_sessions)?;
        if !dropped.drop_reason_distribution.is_empty() {
            writeln!(out, "\n  drop reasons:")?;
            for (reason, count) in by_count(&dropped.drop_reason_distribution) {
                let percent = percent_of(dropped.drop_reason_percentages.as_ref(), reason);
                writeln!(out, "    {reason}: {count} sessions ({percent:.1}%)")?;
            }
        }
    }

    writeln!(out, "\n{rule}")
}

pub fn print_load_breakdown(loads: &[PairLoad]) {
    write_load_breakdown(&mut io::stdout().lock(), loads).ok();
}

pub fn print_match_breakdown(groups: &[GroupMatchStats]) {
    write_match_breakdown(&mut io::stdout().lock(), groups).ok();
}

pub fn print_run_totals(analysis: &AnalysisBody) {
    write_run_totals(&mut io::stdout().lock(), analysis).ok();
}

pub fn print_summary(summary: &LatencySummary) {
    write_summary(&mut io::stdout().lock(), summary).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use crate::pipeline::FileLoad;
    use std::path::PathBuf;

    #[test]
    fn test_format_latency_units() {
        assert_eq!(format_latency(999.94), "999.9 us");
        assert_eq!(format_latency(1_000.0), "1.0 ms");
        assert_eq!(format_latency(15_250.0), "15.2 ms");
        assert_eq!(format_latency(2_500_000.0), "2.5 s");
    }

    #[test]
    fn test_load_breakdown_reports_skipped_and_missing() {
        let loads = vec![PairLoad {
            pair_name: "n1-n2".to_string(),
            files: vec![
                FileLoad {
                    direction: Direction::Outgoing,
                    path: Some(PathBuf::from("logs/out.log")),
                    status: FileStatus::Loaded { sessions: 3, blocks: 4, skipped: 1 },
                },
                FileLoad {
                    direction: Direction::Incoming,
                    path: Some(PathBuf::from("logs/in.log")),
                    status: FileStatus::Missing,
                },
            ],
            records: Vec::new(),
        }];

        let mut buf = Vec::new();
        write_load_breakdown(&mut buf, &loads).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("OUTGOING (out.log): 3 sessions, 1 blocks skipped"));
        assert!(text.contains("INCOMING (in.log): missing"));
        assert!(text.contains("loaded 3 sessions from 1 node pairs"));
    }

    #[test]
    fn test_by_count_sorts_descending() {
        let mut dist = BTreeMap::new();
        dist.insert("a".to_string(), 1);
        dist.insert("b".to_string(), 5);
        dist.insert("c".to_string(), 3);
        let sorted: Vec<_> = by_count(&dist).into_iter().map(|(k, _)| k).collect();
        assert_eq!(sorted, vec!["b", "c", "a"]);
    }
}
