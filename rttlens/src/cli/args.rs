//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rttlens",
    version,
    about = "Locate latency and packet loss in ICMP RTT kernel traces",
    after_help = "\
EXAMPLES:
    rttlens -c pairs.json                                  Analyze every pair in a config file
    rttlens --src-ip 10.0.0.1 --dst-ip 10.0.0.2 \\
            --outgoing n1_out.log --incoming n2_in.log      Analyze a single node pair
    rttlens --summarize reports/storage_analysis.json      Rebuild the summary of an earlier run"
)]
pub struct Args {
    /// Configuration file listing node pairs (.json or .toml)
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["src_ip", "dst_ip", "outgoing", "incoming"])]
    pub config: Option<PathBuf>,

    /// Source IP of a single node pair
    #[arg(long)]
    pub src_ip: Option<String>,

    /// Destination IP of a single node pair
    #[arg(long)]
    pub dst_ip: Option<String>,

    /// Trace captured on the sending node
    #[arg(long, value_name = "FILE")]
    pub outgoing: Option<PathBuf>,

    /// Trace captured on the receiving node
    #[arg(long, value_name = "FILE")]
    pub incoming: Option<PathBuf>,

    /// Directory for the report files (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Analysis name, used as the report file prefix
    #[arg(long)]
    pub name: Option<String>,

    /// Node pairs loaded in parallel (overrides the config file)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Processing overhead per bidirectional session in microseconds
    #[arg(long, value_name = "US")]
    pub processing_delay: Option<f64>,

    /// Abort when any trace file cannot be read
    #[arg(long)]
    pub fail_fast: bool,

    /// Summarize an existing analysis report instead of parsing traces
    #[arg(long, value_name = "ANALYSIS_JSON", conflicts_with = "config")]
    pub summarize: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
