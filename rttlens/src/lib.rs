//! # rttlens - ICMP RTT Trace Latency and Loss Analyzer
//!
//! rttlens reads the per-packet traces written by a kernel ICMP RTT tracer on
//! both ends of a node pair, pairs up the two halves of every echo session and
//! reports where each session spent its time or lost its packet.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────┐     ┌───────────────────────────┐
//! │  outgoing trace (node A)  │     │  incoming trace (node B)  │
//! └─────────────┬─────────────┘     └─────────────┬─────────────┘
//!               │ "=== ICMP RTT Trace:" blocks    │
//!               ▼                                 ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  trace: splitter ──▶ parser ──▶ SessionRecord               │
//! │                        │                                    │
//! │                        ├─▶ loss_detector (buffer identity)  │
//! │                        └─▶ stage_latency (dominant stage)   │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │ records of all pairs
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  analysis: matcher ──▶ bidirectional / unidirectional       │
//! │                   ──▶ AnalysisReport ──▶ summary            │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  export: <name>_analysis.json, <name>_latency_summary.json, │
//! │          console summary                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`trace`]: split raw trace text into blocks and parse each block
//! - [`analysis`]: loss detection, stage attribution, matching, merging and
//!   summary aggregation. Pure functions, no I/O.
//! - [`pipeline`]: load node pairs (optionally in parallel) and run the analysis
//! - [`export`]: JSON report files and console output
//! - [`config`]: node pair configuration from JSON/TOML or CLI flags
//! - [`cli`]: command-line arguments
//! - [`trace_data`]: the parsed session record
//! - [`domain`]: core types (direction, stage transitions, session keys) and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # Analyze every pair listed in a config file
//! rttlens -c pairs.json -o reports/
//!
//! # Re-summarize an earlier run
//! rttlens --summarize reports/storage_analysis.json
//! ```
//!
//! ## Key Concepts
//!
//! - **Stage**: a numbered tracepoint on the packet path (0 = first)
//! - **Path 1 / Path 2**: two independently labeled latency breakdowns recorded
//!   for each session, each a list of stage transitions with their latency
//! - **Drop**: the buffer pointer changed between consecutive early stages,
//!   meaning the packet seen later is not the one seen earlier

pub mod analysis;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod pipeline;
pub mod trace;
pub mod trace_data;
