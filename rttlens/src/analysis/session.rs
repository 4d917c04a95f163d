//! Analyzed session records, the unit handed to reports and the aggregator.
//!
//! Field names are a contract with downstream report consumers and must not
//! be renamed. `session_type` is the serde tag distinguishing the variants.

use crate::domain::{Direction, LatencyMap};
use serde::{Deserialize, Serialize};

/// A matched OUTGOING/INCOMING exchange merged into one judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidirectionalAnalysis {
    pub session_key: String,
    pub pair_name: String,
    pub direction: String,
    pub session_id: u64,
    pub seq: u64,
    pub drop: bool,
    pub drop_details: Vec<String>,
    pub outgoing_max_stage: Option<String>,
    pub outgoing_max_latency: f64,
    pub incoming_max_stage: Option<String>,
    pub incoming_max_latency: f64,
    pub max_stage: Option<String>,
    pub max_latency: f64,
    /// Half the RTT difference between directions, when both report one.
    pub physical_network_delay: Option<f64>,
    /// Configured estimate, not a measurement.
    pub fping_processing_delay: f64,
    pub outgoing_path1_latencies: LatencyMap,
    pub outgoing_path2_latencies: LatencyMap,
    pub incoming_path1_latencies: LatencyMap,
    pub incoming_path2_latencies: LatencyMap,
    pub outgoing_total_rtt: Option<f64>,
    pub incoming_total_rtt: Option<f64>,
    pub is_bidirectional: bool,
}

/// A record whose counterpart in the other direction was never seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnidirectionalAnalysis {
    pub session_key: String,
    pub pair_name: String,
    pub direction_type: Direction,
    pub direction: String,
    pub session_id: u64,
    pub seq: u64,
    pub timestamp: String,
    pub drop: bool,
    pub drop_details: Vec<String>,
    pub max_stage: Option<String>,
    pub max_latency: f64,
    pub total_rtt: Option<f64>,
    pub path1_latencies: LatencyMap,
    pub path2_latencies: LatencyMap,
    pub is_bidirectional: bool,
    pub available_direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "session_type", rename_all = "lowercase")]
pub enum SessionAnalysis {
    Bidirectional(BidirectionalAnalysis),
    Unidirectional(UnidirectionalAnalysis),
}

impl SessionAnalysis {
    #[must_use]
    pub fn session_key(&self) -> &str {
        match self {
            SessionAnalysis::Bidirectional(a) => &a.session_key,
            SessionAnalysis::Unidirectional(a) => &a.session_key,
        }
    }

    #[must_use]
    pub fn pair_name(&self) -> &str {
        match self {
            SessionAnalysis::Bidirectional(a) => &a.pair_name,
            SessionAnalysis::Unidirectional(a) => &a.pair_name,
        }
    }

    #[must_use]
    pub fn is_drop(&self) -> bool {
        match self {
            SessionAnalysis::Bidirectional(a) => a.drop,
            SessionAnalysis::Unidirectional(a) => a.drop,
        }
    }

    #[must_use]
    pub fn drop_details(&self) -> &[String] {
        match self {
            SessionAnalysis::Bidirectional(a) => &a.drop_details,
            SessionAnalysis::Unidirectional(a) => &a.drop_details,
        }
    }

    #[must_use]
    pub fn max_stage(&self) -> Option<&str> {
        match self {
            SessionAnalysis::Bidirectional(a) => a.max_stage.as_deref(),
            SessionAnalysis::Unidirectional(a) => a.max_stage.as_deref(),
        }
    }

    #[must_use]
    pub fn max_latency(&self) -> f64 {
        match self {
            SessionAnalysis::Bidirectional(a) => a.max_latency,
            SessionAnalysis::Unidirectional(a) => a.max_latency,
        }
    }

    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        matches!(self, SessionAnalysis::Bidirectional(_))
    }
}
