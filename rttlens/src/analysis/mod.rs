//! Analysis logic for parsed RTT traces
//!
//! This module contains the pure business logic: per-record loss detection
//! and stage attribution, cross-file matching, bidirectional merging and
//! summary aggregation. Nothing here touches the filesystem.

pub mod bidirectional;
pub mod loss_detector;
pub mod matcher;
pub mod report;
pub mod session;
pub mod stage_latency;
pub mod summary;

pub use bidirectional::{analyze_matched_pair, analyze_unidirectional, DEFAULT_PROCESSING_DELAY_US};
pub use loss_detector::{detect_packet_loss, DropReason, LossVerdict};
pub use matcher::{match_sessions, GroupMatchStats, MatchOutcome, MatchedPair};
pub use report::{AnalysisBody, AnalysisReport, NodePairInfo};
pub use session::{BidirectionalAnalysis, SessionAnalysis, UnidirectionalAnalysis};
pub use stage_latency::{resolve_max_latency, StageAttribution};
pub use summary::{summarize, LatencyRange, LatencySummary};
