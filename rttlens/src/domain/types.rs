//! Domain types providing compile-time safety and self-documentation
//!
//! These wrappers keep trace-level concepts (direction, stage transition,
//! join key) distinct from the plain strings and integers they are parsed
//! from, and make the analysis signatures more expressive.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Which of a node pair's two trace files a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    /// Upper-case tag used in session keys and drop details.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Outgoing => "OUTGOING",
            Direction::Incoming => "INCOMING",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition between two consecutive pipeline stages, rendered `"a->b"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageTransition {
    pub from: u32,
    pub to: u32,
}

impl StageTransition {
    #[must_use]
    pub const fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for StageTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Error returned when a stage transition label is not of the form `"a->b"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStageTransition(pub String);

impl fmt::Display for InvalidStageTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid stage transition label: {:?}", self.0)
    }
}

impl std::error::Error for InvalidStageTransition {}

impl FromStr for StageTransition {
    type Err = InvalidStageTransition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s.split_once("->").ok_or_else(|| InvalidStageTransition(s.to_string()))?;
        let from = from.trim().parse().map_err(|_| InvalidStageTransition(s.to_string()))?;
        let to = to.trim().parse().map_err(|_| InvalidStageTransition(s.to_string()))?;
        Ok(Self { from, to })
    }
}

impl Serialize for StageTransition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StageTransition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(de::Error::custom)
    }
}

/// Composite join key of a probe: (session id, sequence number).
///
/// Unique per direction within one node pair, never globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub session_id: u64,
    pub seq: u64,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.session_id, self.seq)
    }
}

/// Per-transition latencies of one measurement path, in microseconds.
///
/// Keeps entries in the order they were first seen in the trace, which is the
/// scan order the stage-latency resolver relies on for tie-breaking. Absent
/// transitions were not measured; they are never stored as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyMap {
    entries: Vec<(StageTransition, f64)>,
}

impl LatencyMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a latency. A repeated transition keeps its original position
    /// and takes the new value.
    pub fn insert(&mut self, stage: StageTransition, latency_us: f64) {
        if let Some(slot) = self.entries.iter_mut().find(|(s, _)| *s == stage) {
            slot.1 = latency_us;
        } else {
            self.entries.push((stage, latency_us));
        }
    }

    #[must_use]
    pub fn get(&self, stage: &StageTransition) -> Option<f64> {
        self.entries.iter().find(|(s, _)| s == stage).map(|(_, v)| *v)
    }

    #[must_use]
    pub fn contains(&self, stage: &StageTransition) -> bool {
        self.get(stage).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&StageTransition, f64)> {
        self.entries.iter().map(|(s, v)| (s, *v))
    }
}

impl FromIterator<(StageTransition, f64)> for LatencyMap {
    fn from_iter<I: IntoIterator<Item = (StageTransition, f64)>>(iter: I) -> Self {
        let mut map = LatencyMap::new();
        for (stage, latency) in iter {
            map.insert(stage, latency);
        }
        map
    }
}

impl Serialize for LatencyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (stage, latency) in &self.entries {
            map.serialize_entry(stage, latency)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LatencyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LatencyMapVisitor;

        impl<'de> Visitor<'de> for LatencyMapVisitor {
            type Value = LatencyMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of \"a->b\" stage transitions to latencies")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = LatencyMap::new();
                while let Some((stage, latency)) = access.next_entry::<StageTransition, f64>()? {
                    map.insert(stage, latency);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(LatencyMapVisitor)
    }
}
