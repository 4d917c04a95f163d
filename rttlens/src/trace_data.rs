//! Trace data models
//!
//! A trace file holds repeated session blocks; each block parses into one
//! [`SessionRecord`]. Records are immutable once built: the loss verdict and
//! the dominant-stage attribution are derived at parse time.

use crate::analysis::loss_detector::LossVerdict;
use crate::domain::{Direction, LatencyMap, SessionKey};
use crate::trace::{parse_session_block, TraceBlocks};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::Path;

/// Provenance supplied by the caller for every block of one trace file.
///
/// None of these fields are re-derived from block text.
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    pub direction: Direction,
    pub source_file: &'a str,
    pub pair_name: &'a str,
    pub src_ip: &'a str,
    pub dst_ip: &'a str,
}

/// One parsed probe observation from one file, one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    /// Wall-clock timestamp exactly as printed in the block header.
    pub timestamp: String,
    pub direction: Direction,
    pub source_file: String,
    pub pair_name: String,
    /// Probe endpoints from the node pair configuration.
    pub src_ip: String,
    pub dst_ip: String,
    /// Endpoints as printed on the block's session line.
    pub session_src_ip: String,
    pub session_dst_ip: String,
    pub session_id: u64,
    pub seq: u64,
    /// Stage index → pointer-identity token.
    pub stage_pointers: BTreeMap<u32, String>,
    pub loss: LossVerdict,
    pub path1_latencies: LatencyMap,
    pub path2_latencies: LatencyMap,
    pub total_rtt: Option<f64>,
    /// Dominant stage label (`Path1_a->b` / `Path2_a->b`), if any candidate existed.
    pub max_stage: Option<String>,
    pub max_latency: f64,
}

impl SessionRecord {
    #[must_use]
    pub fn key(&self) -> SessionKey {
        SessionKey { session_id: self.session_id, seq: self.seq }
    }

    #[must_use]
    pub fn is_drop(&self) -> bool {
        self.loss.drop
    }
}

/// All records parsed from one trace file, plus block bookkeeping.
#[derive(Debug, Default)]
pub struct TraceFile {
    pub records: Vec<SessionRecord>,
    /// Blocks found after the first delimiter.
    pub blocks: usize,
    /// Blocks dropped for a missing timestamp or session line.
    pub skipped: usize,
}

impl TraceFile {
    /// Parse already-loaded trace content.
    #[must_use]
    pub fn parse(content: &str, ctx: &RecordContext<'_>) -> Self {
        let mut file = TraceFile::default();

        for (index, block) in TraceBlocks::new(content).enumerate() {
            file.blocks += 1;
            if let Some(record) = parse_session_block(block, ctx) {
                if let Some(reason) = record.loss.reason {
                    debug!("{}: session {} lost: {reason}", ctx.source_file, record.key());
                }
                file.records.push(record);
            } else {
                debug!("{}: skipping malformed block #{}", ctx.source_file, index + 1);
                file.skipped += 1;
            }
        }

        if file.skipped > 0 {
            warn!(
                "{}: skipped {} of {} blocks (missing timestamp or session line)",
                ctx.source_file, file.skipped, file.blocks
            );
        }
        info!("{} ({}): {} sessions", ctx.source_file, ctx.direction, file.records.len());

        file
    }

    /// Read and parse a trace file.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; trace collectors
    /// occasionally emit stray bytes in hostnames.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>, ctx: &RecordContext<'_>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(Self::parse(&content, ctx))
    }
}
