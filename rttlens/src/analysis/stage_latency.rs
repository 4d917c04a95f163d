//! Dominant-latency stage attribution.

use crate::domain::{LatencyMap, StageTransition};
use std::fmt;

/// Which latency breakdown a stage label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyPath {
    Path1,
    Path2,
}

impl fmt::Display for LatencyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatencyPath::Path1 => f.write_str("Path1"),
            LatencyPath::Path2 => f.write_str("Path2"),
        }
    }
}

/// The single stage holding the largest attributable latency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StageAttribution {
    /// `Path1_a->b` / `Path2_a->b`; `None` means no attributable stage, not stage 0.
    pub stage: Option<String>,
    pub latency: f64,
}

/// Pick the largest latency across both paths.
///
/// Path-1 entries listed in `corrupted` are skipped; path-2 entries are an
/// independent measurement and always count. Path 1 is scanned before path 2,
/// each in trace order, and a candidate only wins on strict improvement, so
/// the first-seen maximum is kept on ties. Non-positive values never win.
#[must_use]
pub fn resolve_max_latency(
    path1: &LatencyMap,
    path2: &LatencyMap,
    corrupted: &[StageTransition],
) -> StageAttribution {
    let path1_candidates = path1
        .iter()
        .filter(|(stage, _)| !corrupted.contains(stage))
        .map(|(stage, latency)| (LatencyPath::Path1, stage, latency));
    let path2_candidates = path2.iter().map(|(stage, latency)| (LatencyPath::Path2, stage, latency));

    let mut best = StageAttribution::default();
    for (path, stage, latency) in path1_candidates.chain(path2_candidates) {
        if latency > best.latency {
            best = StageAttribution { stage: Some(format!("{path}_{stage}")), latency };
        }
    }
    best
}
