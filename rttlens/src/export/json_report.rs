//! Pretty JSON report files.
//!
//! A run named `storage` writes `storage_analysis.json` and
//! `storage_latency_summary.json` into the output directory.

use crate::analysis::{AnalysisReport, LatencySummary};
use crate::domain::ReportError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const ANALYSIS_SUFFIX: &str = "_analysis.json";
const SUMMARY_SUFFIX: &str = "_latency_summary.json";

#[must_use]
pub fn analysis_file_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{name}{ANALYSIS_SUFFIX}"))
}

#[must_use]
pub fn summary_file_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{name}{SUMMARY_SUFFIX}"))
}

/// Summary path that sits next to an existing analysis file.
///
/// `x/run_analysis.json` becomes `x/run_latency_summary.json`; any other file
/// name gets the summary suffix appended to its stem.
#[must_use]
pub fn summary_path_for(analysis_file: &Path) -> PathBuf {
    let file_name = analysis_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(ANALYSIS_SUFFIX).map_or_else(
        || {
            analysis_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        },
        str::to_string,
    );
    analysis_file.with_file_name(format!("{stem}{SUMMARY_SUFFIX}"))
}

fn write_pretty<T: Serialize>(value: &T, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| ReportError::WriteFailed { path: parent.to_path_buf(), source })?;
    }

    let file = File::create(path)
        .map_err(|source| ReportError::WriteFailed { path: path.to_path_buf(), source })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer
        .flush()
        .map_err(|source| ReportError::WriteFailed { path: path.to_path_buf(), source })
}

/// Write the analysis report, creating the parent directory if needed.
///
/// # Errors
/// Fails if the directory or file cannot be written.
pub fn save_analysis(report: &AnalysisReport, path: &Path) -> Result<(), ReportError> {
    write_pretty(report, path)
}

/// # Errors
/// Fails if the directory or file cannot be written.
pub fn save_summary(summary: &LatencySummary, path: &Path) -> Result<(), ReportError> {
    write_pretty(summary, path)
}

/// Read back an analysis report written by [`save_analysis`].
///
/// # Errors
/// Fails if the file cannot be opened or is not an analysis report.
pub fn load_analysis(path: &Path) -> Result<AnalysisReport, ReportError> {
    let file = File::open(path)
        .map_err(|source| ReportError::ReadFailed { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
