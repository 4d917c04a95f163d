//! Packet loss detection from stage pointer snapshots.
//!
//! Every traced packet is tagged with the kernel object pointer sampled at
//! each pipeline stage. When the pointer changes between two consecutive
//! stages the object was reallocated rather than forwarded, so the packet is
//! treated as lost at that hop. This is a stronger signal than a missing
//! later-stage timestamp.
//!
//! A latency measured across a hop where the identity broke does not describe
//! a single object's transit, so the hop is reported as corrupted and the
//! stage-latency resolver skips it.

use crate::domain::StageTransition;
use std::collections::BTreeMap;
use std::fmt;

/// Why a session was classified as lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Stages 0 and 1 agree but stage 2 carries a different pointer.
    Stage1To2Mismatch,
    /// Stages 0 and 1 already disagree.
    Stage0To1Mismatch,
}

impl DropReason {
    /// Token used in report `drop_details` entries.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            DropReason::Stage1To2Mismatch => "Stage_1_to_2_SKB_Mismatch",
            DropReason::Stage0To1Mismatch => "Stage_0_to_1_SKB_Mismatch",
        }
    }

    /// The hop whose latency is no longer trustworthy.
    #[must_use]
    pub fn corrupted_stage(self) -> StageTransition {
        match self {
            DropReason::Stage1To2Mismatch => StageTransition::new(1, 2),
            DropReason::Stage0To1Mismatch => StageTransition::new(0, 1),
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Stage1To2Mismatch => f.write_str("stage 1→2 identity mismatch"),
            DropReason::Stage0To1Mismatch => f.write_str("stage 0→1 identity mismatch"),
        }
    }
}

/// Loss classification of one session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LossVerdict {
    pub drop: bool,
    pub reason: Option<DropReason>,
    pub corrupted_stages: Vec<StageTransition>,
}

impl LossVerdict {
    /// No loss, nothing corrupted.
    #[must_use]
    pub fn intact() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lost(reason: DropReason) -> Self {
        Self { drop: true, reason: Some(reason), corrupted_stages: vec![reason.corrupted_stage()] }
    }
}

/// Classify a session from its stage pointers.
///
/// Stages 0, 1 and 2 must all be present; with less data the session is
/// reported intact. Checks run in priority order: a 1→2 break behind a stable
/// 0→1 hop first, then any 0→1 break.
#[must_use]
pub fn detect_packet_loss(pointers: &BTreeMap<u32, String>) -> LossVerdict {
    let (Some(p0), Some(p1), Some(p2)) = (pointers.get(&0), pointers.get(&1), pointers.get(&2))
    else {
        return LossVerdict::intact();
    };

    if p0 == p1 && p1 != p2 {
        LossVerdict::lost(DropReason::Stage1To2Mismatch)
    } else if p0 != p1 {
        LossVerdict::lost(DropReason::Stage0To1Mismatch)
    } else {
        LossVerdict::intact()
    }
}
