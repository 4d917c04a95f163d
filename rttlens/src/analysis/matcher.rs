//! Cross-file session matching.
//!
//! Records are grouped by node pair, then by direction. Within one group an
//! OUTGOING record joins the INCOMING record with the same
//! (session id, sequence number). Keys are never compared across groups.
//!
//! ## Data Flow
//!
//! ```text
//! Vec<SessionRecord>
//!     │
//!     ├──► group_by_pair()   pair name → PairGroup { outgoing, incoming }
//!     │
//!     └──► match_group()     per group, independent of every other group
//!              │
//!              ├──► matched        (OUTGOING, INCOMING) with equal keys
//!              ├──► outgoing_only  no INCOMING with that key
//!              └──► incoming_only  key never consumed by a match
//! ```

use crate::domain::{Direction, SessionKey};
use crate::trace_data::SessionRecord;
use log::debug;
use std::collections::{HashMap, HashSet};

/// An OUTGOING and an INCOMING record of the same probe in the same node pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub outgoing: SessionRecord,
    pub incoming: SessionRecord,
}

/// Records of one node pair, split by direction, in input order.
#[derive(Debug, Default)]
pub struct PairGroup {
    pub pair_name: String,
    pub outgoing: Vec<SessionRecord>,
    pub incoming: Vec<SessionRecord>,
}

/// Per-group matching counts, for run output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMatchStats {
    pub pair_name: String,
    pub outgoing: usize,
    pub incoming: usize,
    pub matched: usize,
    pub outgoing_only: usize,
    pub incoming_only: usize,
}

/// Result of matching, concatenated over groups in first-seen group order.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedPair>,
    pub outgoing_only: Vec<SessionRecord>,
    pub incoming_only: Vec<SessionRecord>,
    pub groups: Vec<GroupMatchStats>,
}

impl MatchOutcome {
    fn absorb(&mut self, other: MatchOutcome) {
        self.matched.extend(other.matched);
        self.outgoing_only.extend(other.outgoing_only);
        self.incoming_only.extend(other.incoming_only);
        self.groups.extend(other.groups);
    }
}

/// Group records by pair name, preserving the order groups first appear in.
#[must_use]
pub fn group_by_pair(records: Vec<SessionRecord>) -> Vec<PairGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<PairGroup> = Vec::new();

    for record in records {
        let slot = match index.get(&record.pair_name) {
            Some(&slot) => slot,
            None => {
                index.insert(record.pair_name.clone(), groups.len());
                groups.push(PairGroup { pair_name: record.pair_name.clone(), ..PairGroup::default() });
                groups.len() - 1
            }
        };

        let group = &mut groups[slot];
        match record.direction {
            Direction::Outgoing => group.outgoing.push(record),
            Direction::Incoming => group.incoming.push(record),
        }
    }

    groups
}

/// Match the records of a single node pair.
///
/// When several INCOMING records share a key the last one is the match
/// target. Every INCOMING record whose key was consumed by a match is
/// accounted for by that match and not reported as incoming-only.
#[must_use]
pub fn match_group(group: PairGroup) -> MatchOutcome {
    let PairGroup { pair_name, outgoing, incoming } = group;
    let outgoing_count = outgoing.len();
    let incoming_count = incoming.len();

    let mut lookup: HashMap<SessionKey, usize> = HashMap::with_capacity(incoming.len());
    for (idx, record) in incoming.iter().enumerate() {
        lookup.insert(record.key(), idx);
    }

    // First pass: resolve each OUTGOING record to an INCOMING slot, counting
    // how many times each slot is claimed so the last claim can take ownership.
    let mut claims = vec![0usize; incoming.len()];
    let plan: Vec<(SessionRecord, Option<usize>)> = outgoing
        .into_iter()
        .map(|record| {
            let hit = lookup.get(&record.key()).copied();
            if let Some(idx) = hit {
                claims[idx] += 1;
            }
            (record, hit)
        })
        .collect();

    let mut slots: Vec<Option<SessionRecord>> = incoming.into_iter().map(Some).collect();
    let mut consumed: HashSet<SessionKey> = HashSet::new();
    let mut outcome = MatchOutcome::default();

    for (record, hit) in plan {
        let Some(idx) = hit else {
            outcome.outgoing_only.push(record);
            continue;
        };

        claims[idx] -= 1;
        let partner = if claims[idx] == 0 { slots[idx].take() } else { slots[idx].clone() };
        match partner {
            Some(partner) => {
                consumed.insert(record.key());
                outcome.matched.push(MatchedPair { outgoing: record, incoming: partner });
            }
            None => outcome.outgoing_only.push(record),
        }
    }

    for record in slots.into_iter().flatten() {
        if consumed.contains(&record.key()) {
            debug!(
                "{pair_name}: duplicate INCOMING record for key {} shadowed by a later one",
                record.key()
            );
        } else {
            outcome.incoming_only.push(record);
        }
    }

    outcome.groups.push(GroupMatchStats {
        pair_name,
        outgoing: outgoing_count,
        incoming: incoming_count,
        matched: outcome.matched.len(),
        outgoing_only: outcome.outgoing_only.len(),
        incoming_only: outcome.incoming_only.len(),
    });
    outcome
}

/// Group and match every record of a run.
#[must_use]
pub fn match_sessions(records: Vec<SessionRecord>) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();
    for group in group_by_pair(records) {
        outcome.absorb(match_group(group));
    }
    outcome
}
