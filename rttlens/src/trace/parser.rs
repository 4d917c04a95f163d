//! Session block parser.
//!
//! Turns the loosely structured lines of one trace block into a typed
//! [`SessionRecord`]. A block is expected to look like:
//!
//! ```text
//!  2025-03-14 09:26:53.589793 ===
//! Session: 10.0.0.1 (node1) -> 10.0.0.2 (node2) (ID: 4242, Seq: 7)
//! SKB Pointers:
//!   Stage 0 (ip_send_skb): 0xffff8881a2b3c400
//!   Stage 1 (dev_queue_xmit): 0xffff8881a2b3c400
//!   Stage 2 (icmp_rcv): 0xffff8881a2b3c400
//! Path 1 Latencies (us):
//!   [0->1] ip_send_skb -> dev_queue_xmit: 12.500 us
//!   [1->2] dev_queue_xmit -> icmp_rcv: N/A us
//! Path 2 Latencies (us):
//!   [3->4] icmp_reply -> ip_rcv: 30.100 us
//! Total RTT: 180.250 us
//! ```
//!
//! Only the timestamp and the session line are mandatory. Every other section
//! is optional and an absent section simply yields an empty mapping.

use crate::analysis::loss_detector::detect_packet_loss;
use crate::analysis::stage_latency::resolve_max_latency;
use crate::domain::{LatencyMap, StageTransition};
use crate::trace_data::{RecordContext, SessionRecord};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Header of the first latency breakdown.
pub const PATH1_HEADER: &str = "Path 1 Latencies";
/// Header of the second latency breakdown.
pub const PATH2_HEADER: &str = "Path 2 Latencies";

const SESSION_PREFIX: &str = "Session:";
const POINTER_SECTION: &str = "SKB Pointers";
const TOTAL_RTT_LABEL: &str = "Total RTT";
/// Printed in place of a latency the tracer could not measure.
const UNMEASURED: &str = "N/A";

static TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();
static SESSION_RE: OnceLock<Regex> = OnceLock::new();
static POINTER_RE: OnceLock<Regex> = OnceLock::new();
static STAGE_INDEX_RE: OnceLock<Regex> = OnceLock::new();
static HEX_TOKEN_RE: OnceLock<Regex> = OnceLock::new();
static LATENCY_RE: OnceLock<Regex> = OnceLock::new();
static MICROS_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("built-in pattern is valid"))
}

fn timestamp_re() -> &'static Regex {
    compiled(&TIMESTAMP_RE, r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d+)")
}

fn session_re() -> &'static Regex {
    compiled(
        &SESSION_RE,
        r"Session: ([\d.]+) \([^)]+\) -> ([\d.]+) \([^)]+\) \(ID: (\d+), Seq: (\d+)\)",
    )
}

fn pointer_re() -> &'static Regex {
    compiled(&POINTER_RE, r"Stage\s+(\d+)\s+.*?:\s+(0x[a-fA-F0-9]+)")
}

fn stage_index_re() -> &'static Regex {
    compiled(&STAGE_INDEX_RE, r"Stage\s+(\d+)")
}

fn hex_token_re() -> &'static Regex {
    compiled(&HEX_TOKEN_RE, r"(0x[a-fA-F0-9]+)")
}

fn latency_re() -> &'static Regex {
    compiled(&LATENCY_RE, r"\[\s*(\d+)->(\d+)\s*\].*?:\s*([\d.]+|N/A)\s*us")
}

fn micros_re() -> &'static Regex {
    compiled(&MICROS_RE, r"([\d.]+)\s*us")
}

/// Fields of the `Session:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionIdentity {
    src_ip: String,
    dst_ip: String,
    session_id: u64,
    seq: u64,
}

/// Parse one block into a record.
///
/// Returns `None` when the first line carries no timestamp or the block has
/// no parseable session line; callers count those as skipped blocks.
#[must_use]
pub fn parse_session_block(block: &str, ctx: &RecordContext<'_>) -> Option<SessionRecord> {
    let lines: Vec<&str> = block.trim().lines().collect();

    let timestamp = parse_timestamp(lines.first()?)?;
    let identity = parse_session_identity(&lines)?;

    let stage_pointers = parse_stage_pointers(&lines);
    let loss = detect_packet_loss(&stage_pointers);

    let path1_latencies = parse_path_latencies(&lines, PATH1_HEADER);
    let path2_latencies = parse_path_latencies(&lines, PATH2_HEADER);
    let total_rtt = parse_total_rtt(&lines);

    let attribution = resolve_max_latency(&path1_latencies, &path2_latencies, &loss.corrupted_stages);

    Some(SessionRecord {
        timestamp,
        direction: ctx.direction,
        source_file: ctx.source_file.to_string(),
        pair_name: ctx.pair_name.to_string(),
        src_ip: ctx.src_ip.to_string(),
        dst_ip: ctx.dst_ip.to_string(),
        session_src_ip: identity.src_ip,
        session_dst_ip: identity.dst_ip,
        session_id: identity.session_id,
        seq: identity.seq,
        stage_pointers,
        loss,
        path1_latencies,
        path2_latencies,
        total_rtt,
        max_stage: attribution.stage,
        max_latency: attribution.latency,
    })
}

fn parse_timestamp(line: &str) -> Option<String> {
    timestamp_re().captures(line).map(|caps| caps[1].to_string())
}

fn parse_session_identity(lines: &[&str]) -> Option<SessionIdentity> {
    let line = lines.iter().find(|line| line.starts_with(SESSION_PREFIX))?;
    let caps = session_re().captures(line)?;

    Some(SessionIdentity {
        src_ip: caps[1].to_string(),
        dst_ip: caps[2].to_string(),
        session_id: caps[3].parse().ok()?,
        seq: caps[4].parse().ok()?,
    })
}

fn is_path_header(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("Path") && line.contains("Latencies")
}

/// Extract stage pointer snapshots from the pointer section.
///
/// The section starts after the `SKB Pointers` line and ends at the first
/// path latency header. Each line is tried against the strict pattern first
/// and then split manually on `:` so irregular spacing does not lose data.
#[must_use]
pub fn parse_stage_pointers(lines: &[&str]) -> BTreeMap<u32, String> {
    let mut pointers = BTreeMap::new();
    let mut in_section = false;

    for line in lines {
        if line.contains(POINTER_SECTION) {
            in_section = true;
            continue;
        }
        if is_path_header(line) {
            break;
        }
        if !in_section || line.trim().is_empty() {
            continue;
        }

        if let Some((stage, pointer)) =
            strict_pointer(line).or_else(|| tolerant_pointer(line))
        {
            pointers.insert(stage, pointer.to_string());
        }
    }

    pointers
}

fn strict_pointer(line: &str) -> Option<(u32, &str)> {
    let caps = pointer_re().captures(line)?;
    let stage = caps.get(1)?.as_str().parse().ok()?;
    Some((stage, caps.get(2)?.as_str()))
}

fn tolerant_pointer(line: &str) -> Option<(u32, &str)> {
    let mut parts = line.split(':');
    let head = parts.next()?;
    let tail = parts.next()?;
    if !head.contains("Stage") || !tail.contains("0x") {
        return None;
    }

    let stage = stage_index_re().captures(head)?.get(1)?.as_str().parse().ok()?;
    let pointer = hex_token_re().captures(tail)?.get(1)?.as_str();
    Some((stage, pointer))
}

/// Extract the `[a->b] ...: value us` entries under a latency header.
///
/// The section runs until the next line starting with `Path` or `Total`.
/// Unmeasured (`N/A`) and non-numeric values are left out of the mapping.
#[must_use]
pub fn parse_path_latencies(lines: &[&str], header: &str) -> LatencyMap {
    let mut latencies = LatencyMap::new();
    let mut in_section = false;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with(header) {
            in_section = true;
            continue;
        }
        if !in_section {
            continue;
        }
        if trimmed.starts_with("Path") || trimmed.starts_with("Total") {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        let Some(caps) = latency_re().captures(line) else {
            continue;
        };
        let value = &caps[3];
        if value == UNMEASURED {
            continue;
        }
        let (Ok(from), Ok(to), Ok(latency)) =
            (caps[1].parse::<u32>(), caps[2].parse::<u32>(), value.parse::<f64>())
        else {
            continue;
        };
        latencies.insert(StageTransition::new(from, to), latency);
    }

    latencies
}

/// Extract the total round-trip time, if the block reports one.
#[must_use]
pub fn parse_total_rtt(lines: &[&str]) -> Option<f64> {
    lines
        .iter()
        .filter(|line| line.contains(TOTAL_RTT_LABEL) && line.contains(':'))
        .find_map(|line| micros_re().captures(line)?.get(1)?.as_str().parse().ok())
}
