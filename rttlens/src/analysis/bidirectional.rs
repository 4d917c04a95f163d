//! Merges matched sessions into bidirectional judgments.
//!
//! # Rules
//!
//! - **Loss**: the exchange is lost if either direction lost the packet. Each
//!   losing direction contributes one `<DIRECTION>_<reason tag>` detail.
//! - **Dominant stage**: the direction with the larger `max_latency`; ties go
//!   to OUTGOING. The winning stage label is prefixed with its direction.
//! - **Physical delay**: `|rtt_out - rtt_in| / 2` when both directions report
//!   a total RTT. Instrumentation overhead, not path asymmetry, is assumed to
//!   explain most of the difference.
//! - **Processing delay**: a configured estimate attached verbatim.

use super::matcher::MatchedPair;
use super::session::{BidirectionalAnalysis, UnidirectionalAnalysis};
use crate::domain::Direction;
use crate::trace_data::SessionRecord;

/// Probe processing overhead assumed per exchange, in microseconds.
pub const DEFAULT_PROCESSING_DELAY_US: f64 = 50.0;

fn drop_detail(direction: Direction, record: &SessionRecord) -> Option<String> {
    if !record.is_drop() {
        return None;
    }
    let reason = record.loss.reason.map_or("Unknown", |r| r.tag());
    Some(format!("{direction}_{reason}"))
}

fn tagged_stage(direction: Direction, stage: Option<&String>) -> Option<String> {
    stage.map(|stage| format!("{direction}_{stage}"))
}

/// Session key of a bidirectional exchange: `<pair>_<id>_<seq>`.
#[must_use]
pub fn bidirectional_key(record: &SessionRecord) -> String {
    format!("{}_{}_{}", record.pair_name, record.session_id, record.seq)
}

/// Session key of a one-sided record: `<pair>_<DIRECTION>_<id>_<seq>`.
#[must_use]
pub fn unidirectional_key(record: &SessionRecord, direction: Direction) -> String {
    format!("{}_{direction}_{}_{}", record.pair_name, record.session_id, record.seq)
}

/// Merge a matched pair into one bidirectional analysis.
#[must_use]
pub fn analyze_matched_pair(pair: &MatchedPair, processing_delay_us: f64) -> BidirectionalAnalysis {
    let out = &pair.outgoing;
    let inc = &pair.incoming;

    let drop_details: Vec<String> = [
        drop_detail(Direction::Outgoing, out),
        drop_detail(Direction::Incoming, inc),
    ]
    .into_iter()
    .flatten()
    .collect();

    let (max_stage, max_latency) = if out.max_latency >= inc.max_latency {
        (tagged_stage(Direction::Outgoing, out.max_stage.as_ref()), out.max_latency)
    } else {
        (tagged_stage(Direction::Incoming, inc.max_stage.as_ref()), inc.max_latency)
    };

    let physical_network_delay = match (out.total_rtt, inc.total_rtt) {
        (Some(out_rtt), Some(in_rtt)) => Some((out_rtt - in_rtt).abs() / 2.0),
        _ => None,
    };

    BidirectionalAnalysis {
        session_key: bidirectional_key(out),
        pair_name: out.pair_name.clone(),
        direction: format!("{}->{}", out.src_ip, out.dst_ip),
        session_id: out.session_id,
        seq: out.seq,
        drop: out.is_drop() || inc.is_drop(),
        drop_details,
        outgoing_max_stage: out.max_stage.clone(),
        outgoing_max_latency: out.max_latency,
        incoming_max_stage: inc.max_stage.clone(),
        incoming_max_latency: inc.max_latency,
        max_stage,
        max_latency,
        physical_network_delay,
        fping_processing_delay: processing_delay_us,
        outgoing_path1_latencies: out.path1_latencies.clone(),
        outgoing_path2_latencies: out.path2_latencies.clone(),
        incoming_path1_latencies: inc.path1_latencies.clone(),
        incoming_path2_latencies: inc.path2_latencies.clone(),
        outgoing_total_rtt: out.total_rtt,
        incoming_total_rtt: inc.total_rtt,
        is_bidirectional: true,
    }
}

/// Analyze a record whose other direction is missing; its verdict is copied as-is.
#[must_use]
pub fn analyze_unidirectional(record: &SessionRecord) -> UnidirectionalAnalysis {
    let direction = record.direction;

    UnidirectionalAnalysis {
        session_key: unidirectional_key(record, direction),
        pair_name: record.pair_name.clone(),
        direction_type: direction,
        direction: format!("{}->{}", record.src_ip, record.dst_ip),
        session_id: record.session_id,
        seq: record.seq,
        timestamp: record.timestamp.clone(),
        drop: record.is_drop(),
        drop_details: drop_detail(direction, record).into_iter().collect(),
        max_stage: record.max_stage.clone(),
        max_latency: record.max_latency,
        total_rtt: record.total_rtt,
        path1_latencies: record.path1_latencies.clone(),
        path2_latencies: record.path2_latencies.clone(),
        is_bidirectional: false,
        available_direction: direction,
    }
}
