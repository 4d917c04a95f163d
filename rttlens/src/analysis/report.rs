//! The analysis report: every analyzed session of a run, split into valid
//! and dropped sessions, plus the node pairs that produced them.

use super::bidirectional::{analyze_matched_pair, analyze_unidirectional};
use super::matcher::MatchOutcome;
use super::session::SessionAnalysis;
use crate::config::NodePairConfig;
use serde::{Deserialize, Serialize};

/// Node pair as listed in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePairInfo {
    pub pair_name: String,
    pub src_ip: String,
    pub dst_ip: String,
    pub direction: String,
}

impl From<&NodePairConfig> for NodePairInfo {
    fn from(pair: &NodePairConfig) -> Self {
        Self {
            pair_name: pair.pair_name(),
            src_ip: pair.src_ip.clone(),
            dst_ip: pair.dst_ip.clone(),
            direction: pair.direction(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBody {
    pub node_pairs: Vec<NodePairInfo>,
    /// Local time the report was generated, ISO-8601.
    pub timestamp: String,
    pub total_sessions: usize,
    pub matched_sessions: usize,
    pub outgoing_only: usize,
    pub incoming_only: usize,
    pub valid_sessions: Vec<SessionAnalysis>,
    pub dropped_sessions: Vec<SessionAnalysis>,
}

/// Top-level analysis document (`{"analysis": {...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis: AnalysisBody,
}

impl AnalysisReport {
    /// Analyze every matched and unmatched session of a run.
    ///
    /// Sessions are emitted bidirectional first, then outgoing-only, then
    /// incoming-only, each routed to `dropped_sessions` or `valid_sessions`.
    #[must_use]
    pub fn build(
        node_pairs: Vec<NodePairInfo>,
        outcome: &MatchOutcome,
        processing_delay_us: f64,
        timestamp: String,
    ) -> Self {
        let bidirectional = outcome
            .matched
            .iter()
            .map(|pair| SessionAnalysis::Bidirectional(analyze_matched_pair(pair, processing_delay_us)));
        let unidirectional = outcome
            .outgoing_only
            .iter()
            .chain(&outcome.incoming_only)
            .map(|record| SessionAnalysis::Unidirectional(analyze_unidirectional(record)));

        let (dropped_sessions, valid_sessions): (Vec<_>, Vec<_>) =
            bidirectional.chain(unidirectional).partition(SessionAnalysis::is_drop);

        Self {
            analysis: AnalysisBody {
                node_pairs,
                timestamp,
                total_sessions: outcome.matched.len()
                    + outcome.outgoing_only.len()
                    + outcome.incoming_only.len(),
                matched_sessions: outcome.matched.len(),
                outgoing_only: outcome.outgoing_only.len(),
                incoming_only: outcome.incoming_only.len(),
                valid_sessions,
                dropped_sessions,
            },
        }
    }
}

/// Current local time in the report's timestamp format.
#[must_use]
pub fn report_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
