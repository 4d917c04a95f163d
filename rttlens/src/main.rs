//! # rttlens - Main Entry Point
//!
//! Supports two operational modes:
//! - **Analyze** (`-c pairs.json` or `--src-ip/--dst-ip` with trace files):
//!   parse traces, write the analysis report and its summary
//! - **Summarize** (`--summarize run_analysis.json`): rebuild the summary of an
//!   earlier analysis report without touching the traces

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::{Path, PathBuf};

use rttlens::analysis::summarize;
use rttlens::cli::Args;
use rttlens::config::{AnalysisConfig, NodePairConfig};
use rttlens::export::{self, console};
use rttlens::pipeline::AnalysisPipeline;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("missing required argument") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

/// Build the run configuration from a config file or the single-pair flags,
/// then apply command-line overrides.
fn resolve_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = if let Some(ref path) = args.config {
        if !args.quiet {
            println!("config: {}", path.display());
        }
        let mut config = AnalysisConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?;
        if let Some(ref name) = args.name {
            config.name.clone_from(name);
        }
        config
    } else {
        let (Some(src_ip), Some(dst_ip)) = (args.src_ip.clone(), args.dst_ip.clone()) else {
            anyhow::bail!(
                "Missing required argument: --config or --src-ip/--dst-ip\n\n\
                 Usage:\n  \
                 rttlens -c pairs.json\n  \
                 rttlens --src-ip A --dst-ip B --outgoing out.log --incoming in.log\n\n\
                 Run 'rttlens --help' for more options"
            );
        };
        if args.outgoing.is_none() && args.incoming.is_none() {
            anyhow::bail!("Missing required argument: --outgoing and/or --incoming");
        }
        let pair = NodePairConfig {
            name: None,
            src_ip,
            dst_ip,
            outgoing_file: args.outgoing.clone(),
            incoming_file: args.incoming.clone(),
        };
        AnalysisConfig::single_pair(pair, args.name.clone())
    };

    if let Some(ref dir) = args.output_dir {
        config.output_dir = Some(dir.clone());
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(delay) = args.processing_delay {
        config.processing_delay_us = delay;
    }
    Ok(config)
}

fn run_summarize(analysis_file: &Path, args: &Args) -> Result<()> {
    let report = export::load_analysis(analysis_file)
        .with_context(|| format!("Failed to load analysis report {}", analysis_file.display()))?;
    info!("Loaded analysis report {}", analysis_file.display());

    let summary = summarize(&report.analysis);
    let summary_file = match args.output_dir {
        Some(ref dir) => {
            let name = export::summary_path_for(analysis_file);
            dir.join(name.file_name().unwrap_or_default())
        }
        None => export::summary_path_for(analysis_file),
    };
    export::save_summary(&summary, &summary_file).context("Failed to save latency summary")?;

    if !args.quiet {
        console::print_summary(&summary);
        println!("saved: {}", summary_file.display());
    }
    Ok(())
}

fn run() -> Result<()> {
    let args = Args::parse();

    if let Some(ref analysis_file) = args.summarize {
        return run_summarize(analysis_file, &args);
    }

    let config = resolve_config(&args)?;
    let quiet = args.quiet;
    let output_dir = config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let name = config.name.clone();

    if !quiet {
        println!("rttlens v{}", env!("CARGO_PKG_VERSION"));
        println!("node pairs: {}", config.node_pairs.len());
        if config.jobs > 1 {
            println!("jobs: {}", config.jobs);
        }
    }

    let pipeline = AnalysisPipeline::new(config);

    let mut loads = Vec::new();
    for result in pipeline.load_all() {
        match result {
            Ok(load) => loads.push(load),
            Err(e) if args.fail_fast => return Err(e).context("Aborting on unreadable trace (--fail-fast)"),
            Err(e) => {
                error!("{e}");
                if !quiet {
                    eprintln!("warning: {e}");
                }
            }
        }
    }

    if !quiet {
        console::print_load_breakdown(&loads);
    }

    let analysis_run = pipeline.analyze(loads);
    let analysis = &analysis_run.report.analysis;

    if !quiet {
        console::print_match_breakdown(&analysis_run.groups);
        console::print_run_totals(analysis);
    }

    let analysis_file = export::analysis_file_path(&output_dir, &name);
    export::save_analysis(&analysis_run.report, &analysis_file).context("Failed to save analysis report")?;

    let summary = summarize(analysis);
    let summary_file = export::summary_file_path(&output_dir, &name);
    export::save_summary(&summary, &summary_file).context("Failed to save latency summary")?;

    if !quiet {
        console::print_summary(&summary);
        println!("saved: {}", analysis_file.display());
        println!("saved: {}", summary_file.display());
    }

    Ok(())
}
