//! Latency summary aggregation.
//!
//! Builds distributions and statistics from an [`AnalysisBody`]:
//!
//! - **Valid sessions** with a positive `max_latency` feed the latency list and
//!   range distribution, overall and per node pair. Sessions at or above
//!   10 ms also feed the "above 10 ms" distribution and the stage distribution.
//! - **Dropped sessions** feed a stage distribution and a drop reason
//!   distribution (one count per drop detail).
//!
//! Percentile picks use `sorted[floor(n * q)]`, matching earlier reports.

// Percentage and percentile math intentionally converts counts to f64
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use super::report::{AnalysisBody, NodePairInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latencies at or above this many milliseconds count as "slow".
pub const SLOW_THRESHOLD_MS: f64 = 10.0;

/// Latency bucket of a session's dominant latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LatencyRange {
    Under10Ms,
    Under100Ms,
    Under500Ms,
    Under1000Ms,
    Under3000Ms,
    Under60000Ms,
    Over60000Ms,
}

impl LatencyRange {
    /// All ranges in display order.
    pub const ALL: [LatencyRange; 7] = [
        LatencyRange::Under10Ms,
        LatencyRange::Under100Ms,
        LatencyRange::Under500Ms,
        LatencyRange::Under1000Ms,
        LatencyRange::Under3000Ms,
        LatencyRange::Under60000Ms,
        LatencyRange::Over60000Ms,
    ];

    /// Classify a latency given in microseconds.
    #[must_use]
    pub fn classify(latency_us: f64) -> Self {
        let ms = latency_us / 1000.0;
        if ms < 10.0 {
            LatencyRange::Under10Ms
        } else if ms < 100.0 {
            LatencyRange::Under100Ms
        } else if ms < 500.0 {
            LatencyRange::Under500Ms
        } else if ms < 1000.0 {
            LatencyRange::Under1000Ms
        } else if ms < 3000.0 {
            LatencyRange::Under3000Ms
        } else if ms < 60000.0 {
            LatencyRange::Under60000Ms
        } else {
            LatencyRange::Over60000Ms
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LatencyRange::Under10Ms => "0-10ms",
            LatencyRange::Under100Ms => "10-100ms",
            LatencyRange::Under500Ms => "100-500ms",
            LatencyRange::Under1000Ms => "500-1000ms",
            LatencyRange::Under3000Ms => "1000-3000ms",
            LatencyRange::Under60000Ms => "3000-60000ms",
            LatencyRange::Over60000Ms => ">60000ms",
        }
    }
}

/// Descriptive statistics over a list of latencies (µs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; 0 for a single value.
    pub std: f64,
    pub p95: f64,
    pub p99: f64,
}

impl LatencyStatistics {
    /// `None` for an empty list.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let std = if n > 1 {
            let variance =
                sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Some(Self {
            count: n,
            mean,
            median,
            min: sorted[0],
            max: sorted[n - 1],
            std,
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        })
    }
}

fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    let idx = ((sorted.len() as f64 * quantile) as usize).min(sorted.len() - 1);
    sorted[idx]
}

type Distribution = BTreeMap<String, usize>;
type Percentages = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAnalysis {
    pub total_valid_sessions: usize,
    pub sessions_with_latency: usize,
    pub latency_distribution: Distribution,
    pub latency_distribution_above_10ms: Distribution,
    pub stage_distribution: Distribution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_statistics: Option<LatencyStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_percentages: Option<Percentages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_percentages: Option<Percentages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_percentages_above_10ms: Option<Percentages>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedSessionsAnalysis {
    pub total_dropped_sessions: usize,
    pub stage_distribution: Distribution,
    pub drop_reason_distribution: Distribution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_percentages: Option<Percentages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_reason_percentages: Option<Percentages>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairAnalysis {
    /// Valid sessions of this pair that had a positive latency.
    pub total_sessions: usize,
    pub latency_distribution: Distribution,
    pub latency_distribution_above_10ms: Distribution,
    pub stage_distribution: Distribution,
    pub latency_statistics: LatencyStatistics,
}

/// The summary document written next to the analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub node_pairs: Vec<NodePairInfo>,
    pub total_sessions: usize,
    pub matched_sessions: usize,
    pub outgoing_only: usize,
    pub incoming_only: usize,
    pub overall_analysis: OverallAnalysis,
    pub dropped_sessions_analysis: DroppedSessionsAnalysis,
    pub pair_analysis: BTreeMap<String, PairAnalysis>,
}

/// Latency accumulator shared by the overall view and each pair.
#[derive(Debug, Default)]
struct LatencyBuckets {
    latencies: Vec<f64>,
    ranges: Distribution,
    ranges_above_10ms: Distribution,
    stages: Distribution,
}

impl LatencyBuckets {
    fn record(&mut self, latency_us: f64, stage: Option<&str>) {
        self.latencies.push(latency_us);
        let label = LatencyRange::classify(latency_us).label();
        bump(&mut self.ranges, label);

        if latency_us / 1000.0 >= SLOW_THRESHOLD_MS {
            bump(&mut self.ranges_above_10ms, label);
            if let Some(stage) = stage.filter(|s| !s.is_empty()) {
                bump(&mut self.stages, stage);
            }
        }
    }
}

fn bump(distribution: &mut Distribution, key: &str) {
    *distribution.entry(key.to_string()).or_insert(0) += 1;
}

fn percentages(distribution: &Distribution, total: usize) -> Percentages {
    distribution
        .iter()
        .map(|(key, &count)| (key.clone(), count as f64 / total as f64 * 100.0))
        .collect()
}

/// Aggregate an analysis report into a latency summary.
#[must_use]
pub fn summarize(analysis: &AnalysisBody) -> LatencySummary {
    let mut overall = LatencyBuckets::default();
    let mut pairs: BTreeMap<String, LatencyBuckets> = BTreeMap::new();

    for session in &analysis.valid_sessions {
        let pair = pairs.entry(session.pair_name().to_string()).or_default();
        let latency = session.max_latency();
        if latency > 0.0 {
            overall.record(latency, session.max_stage());
            pair.record(latency, session.max_stage());
        }
    }

    let mut dropped_stages = Distribution::new();
    let mut drop_reasons = Distribution::new();
    for session in &analysis.dropped_sessions {
        if let Some(stage) = session.max_stage().filter(|s| !s.is_empty()) {
            bump(&mut dropped_stages, stage);
        }
        for reason in session.drop_details() {
            bump(&mut drop_reasons, reason);
        }
    }

    let with_latency = overall.latencies.len();
    let above_10ms: usize = overall.ranges_above_10ms.values().sum();
    let total_dropped = analysis.dropped_sessions.len();

    let overall_analysis = OverallAnalysis {
        total_valid_sessions: analysis.valid_sessions.len(),
        sessions_with_latency: with_latency,
        latency_statistics: LatencyStatistics::from_values(&overall.latencies),
        range_percentages: (with_latency > 0).then(|| percentages(&overall.ranges, with_latency)),
        stage_percentages: (with_latency > 0).then(|| {
            if above_10ms > 0 {
                percentages(&overall.stages, above_10ms)
            } else {
                Percentages::new()
            }
        }),
        range_percentages_above_10ms: (with_latency > 0 && above_10ms > 0)
            .then(|| percentages(&overall.ranges_above_10ms, above_10ms)),
        latency_distribution: overall.ranges,
        latency_distribution_above_10ms: overall.ranges_above_10ms,
        stage_distribution: overall.stages,
    };

    let dropped_sessions_analysis = DroppedSessionsAnalysis {
        total_dropped_sessions: total_dropped,
        stage_percentages: (total_dropped > 0).then(|| percentages(&dropped_stages, total_dropped)),
        drop_reason_percentages: (total_dropped > 0)
            .then(|| percentages(&drop_reasons, total_dropped)),
        stage_distribution: dropped_stages,
        drop_reason_distribution: drop_reasons,
    };

    let pair_analysis = pairs
        .into_iter()
        .filter_map(|(name, buckets)| {
            let latency_statistics = LatencyStatistics::from_values(&buckets.latencies)?;
            Some((
                name,
                PairAnalysis {
                    total_sessions: buckets.latencies.len(),
                    latency_distribution: buckets.ranges,
                    latency_distribution_above_10ms: buckets.ranges_above_10ms,
                    stage_distribution: buckets.stages,
                    latency_statistics,
                },
            ))
        })
        .collect();

    LatencySummary {
        node_pairs: analysis.node_pairs.clone(),
        total_sessions: analysis.total_sessions,
        matched_sessions: analysis.matched_sessions,
        outgoing_only: analysis.outgoing_only,
        incoming_only: analysis.incoming_only,
        overall_analysis,
        dropped_sessions_analysis,
        pair_analysis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::session::{SessionAnalysis, UnidirectionalAnalysis};
    use crate::domain::{Direction, LatencyMap};

    fn session(pair: &str, latency: f64, stage: Option<&str>, drop: Option<&str>) -> SessionAnalysis {
        SessionAnalysis::Unidirectional(UnidirectionalAnalysis {
            session_key: format!("{pair}_OUTGOING_1_1"),
            pair_name: pair.to_string(),
            direction_type: Direction::Outgoing,
            direction: "10.0.0.1->10.0.0.2".to_string(),
            session_id: 1,
            seq: 1,
            timestamp: "2025-03-14 09:26:53.589793".to_string(),
            drop: drop.is_some(),
            drop_details: drop.map(str::to_string).into_iter().collect(),
            max_stage: stage.map(str::to_string),
            max_latency: latency,
            total_rtt: None,
            path1_latencies: LatencyMap::new(),
            path2_latencies: LatencyMap::new(),
            is_bidirectional: false,
            available_direction: Direction::Outgoing,
        })
    }

    fn body(valid: Vec<SessionAnalysis>, dropped: Vec<SessionAnalysis>) -> AnalysisBody {
        AnalysisBody {
            node_pairs: Vec::new(),
            timestamp: "2025-03-14T10:00:00.000000".to_string(),
            total_sessions: valid.len() + dropped.len(),
            matched_sessions: 0,
            outgoing_only: valid.len() + dropped.len(),
            incoming_only: 0,
            valid_sessions: valid,
            dropped_sessions: dropped,
        }
    }

    #[test]
    fn test_range_boundaries() {
        assert_eq!(LatencyRange::classify(9_999.0), LatencyRange::Under10Ms);
        assert_eq!(LatencyRange::classify(10_000.0), LatencyRange::Under100Ms);
        assert_eq!(LatencyRange::classify(499_999.0), LatencyRange::Under500Ms);
        assert_eq!(LatencyRange::classify(1_000_000.0), LatencyRange::Under3000Ms);
        assert_eq!(LatencyRange::classify(60_000_000.0), LatencyRange::Over60000Ms);
        assert_eq!(LatencyRange::Over60000Ms.label(), ">60000ms");
    }

    #[test]
    fn test_statistics_single_value() {
        let stats = LatencyStatistics::from_values(&[42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert!((stats.median - 42.0).abs() < f64::EPSILON);
        assert!(stats.std.abs() < f64::EPSILON);
        assert!((stats.p95 - 42.0).abs() < f64::EPSILON);
        assert!((stats.p99 - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_multiple_values() {
        let stats = LatencyStatistics::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert!((stats.mean - 2.5).abs() < 1e-9);
        assert!((stats.median - 2.5).abs() < 1e-9);
        assert!((stats.min - 1.0).abs() < f64::EPSILON);
        assert!((stats.max - 4.0).abs() < f64::EPSILON);
        // sample std of 1..=4
        assert!((stats.std - 1.290_994_448_735_805_6).abs() < 1e-9);
        // floor(4 * 0.95) = 3
        assert!((stats.p95 - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_empty() {
        assert!(LatencyStatistics::from_values(&[]).is_none());
    }

    #[test]
    fn test_stage_distribution_only_counts_slow_sessions() {
        let summary = summarize(&body(
            vec![
                session("a", 500.0, Some("Path1_0->1"), None),
                session("a", 15_000.0, Some("Path2_3->4"), None),
                session("a", 0.0, None, None),
            ],
            Vec::new(),
        ));

        let overall = &summary.overall_analysis;
        assert_eq!(overall.total_valid_sessions, 3);
        assert_eq!(overall.sessions_with_latency, 2);
        assert_eq!(overall.latency_distribution["0-10ms"], 1);
        assert_eq!(overall.latency_distribution["10-100ms"], 1);
        assert_eq!(overall.latency_distribution_above_10ms.len(), 1);
        assert_eq!(overall.stage_distribution.len(), 1);
        assert_eq!(overall.stage_distribution["Path2_3->4"], 1);

        let stage_pct = overall.stage_percentages.as_ref().unwrap();
        assert!((stage_pct["Path2_3->4"] - 100.0).abs() < 1e-9);
        let range_pct = overall.range_percentages.as_ref().unwrap();
        assert!((range_pct["0-10ms"] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_latency_omits_percentages() {
        let summary = summarize(&body(vec![session("a", 0.0, None, None)], Vec::new()));

        assert!(summary.overall_analysis.latency_statistics.is_none());
        assert!(summary.overall_analysis.range_percentages.is_none());
        assert!(summary.pair_analysis.is_empty());

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["overall_analysis"].get("latency_statistics").is_none());
    }

    #[test]
    fn test_dropped_sessions_analysis() {
        let summary = summarize(&body(
            Vec::new(),
            vec![
                session("a", 20.0, Some("Path1_0->1"), Some("OUTGOING_Stage_1_to_2_SKB_Mismatch")),
                session("a", 0.0, None, Some("OUTGOING_Stage_0_to_1_SKB_Mismatch")),
            ],
        ));

        let dropped = &summary.dropped_sessions_analysis;
        assert_eq!(dropped.total_dropped_sessions, 2);
        assert_eq!(dropped.stage_distribution["Path1_0->1"], 1);
        assert_eq!(dropped.drop_reason_distribution.len(), 2);
        let pct = dropped.drop_reason_percentages.as_ref().unwrap();
        assert!((pct["OUTGOING_Stage_0_to_1_SKB_Mismatch"] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_pair_analysis_per_pair() {
        let summary = summarize(&body(
            vec![
                session("a", 100.0, Some("Path1_0->1"), None),
                session("a", 300.0, Some("Path1_0->1"), None),
                session("b", 20_000.0, Some("Path2_3->4"), None),
            ],
            Vec::new(),
        ));

        assert_eq!(summary.pair_analysis.len(), 2);
        let a = &summary.pair_analysis["a"];
        assert_eq!(a.total_sessions, 2);
        assert!((a.latency_statistics.mean - 200.0).abs() < 1e-9);
        assert!(a.stage_distribution.is_empty());

        let b = &summary.pair_analysis["b"];
        assert_eq!(b.stage_distribution["Path2_3->4"], 1);
    }
}
