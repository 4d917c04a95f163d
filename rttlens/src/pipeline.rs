//! Batch pipeline: load every node pair, match, analyze.
//!
//! Loading is per node pair and shares no state between pairs, so pairs can
//! be parsed on worker threads. Each worker sends its finished [`PairLoad`]
//! back over a channel to the calling thread, which restores configuration
//! order before matching.

use crate::analysis::report::{report_timestamp, AnalysisReport, NodePairInfo};
use crate::analysis::{match_sessions, GroupMatchStats};
use crate::config::{AnalysisConfig, NodePairConfig};
use crate::domain::{AnalyzerError, Direction};
use crate::trace_data::{RecordContext, SessionRecord, TraceFile};
use log::{info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// What happened to one configured trace file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// No file configured for this direction.
    NotConfigured,
    /// Configured but absent on disk; contributes zero records.
    Missing,
    Loaded { sessions: usize, blocks: usize, skipped: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLoad {
    pub direction: Direction,
    pub path: Option<PathBuf>,
    pub status: FileStatus,
}

/// Records of one node pair, both directions.
#[derive(Debug)]
pub struct PairLoad {
    pub pair_name: String,
    pub files: Vec<FileLoad>,
    pub records: Vec<SessionRecord>,
}

impl PairLoad {
    /// Blocks skipped across both files.
    #[must_use]
    pub fn skipped_blocks(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Loaded { skipped, .. } => skipped,
                _ => 0,
            })
            .sum()
    }
}

/// Output of [`AnalysisPipeline::analyze`].
#[derive(Debug)]
pub struct AnalysisRun {
    pub report: AnalysisReport,
    pub groups: Vec<GroupMatchStats>,
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Load one direction of a node pair.
fn load_direction(
    pair: &NodePairConfig,
    pair_name: &str,
    direction: Direction,
    path: Option<&Path>,
) -> Result<(FileLoad, Vec<SessionRecord>), AnalyzerError> {
    let Some(path) = path else {
        return Ok((FileLoad { direction, path: None, status: FileStatus::NotConfigured }, Vec::new()));
    };

    let source_file = file_label(path);
    let ctx = RecordContext {
        direction,
        source_file: &source_file,
        pair_name,
        src_ip: &pair.src_ip,
        dst_ip: &pair.dst_ip,
    };
    classify_read(pair_name, direction, path, TraceFile::from_file(path, &ctx))
}

/// Turn the outcome of reading one trace file into its load status.
///
/// Only `NotFound` counts as a missing file; any other I/O failure on a
/// configured path is [`AnalyzerError::TraceUnreadable`].
fn classify_read(
    pair_name: &str,
    direction: Direction,
    path: &Path,
    read: std::io::Result<TraceFile>,
) -> Result<(FileLoad, Vec<SessionRecord>), AnalyzerError> {
    let trace = match read {
        Ok(trace) => trace,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{pair_name}: {direction} trace {} does not exist, skipping", path.display());
            let load = FileLoad { direction, path: Some(path.to_path_buf()), status: FileStatus::Missing };
            return Ok((load, Vec::new()));
        }
        Err(source) => {
            return Err(AnalyzerError::TraceUnreadable {
                pair_name: pair_name.to_string(),
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let status = FileStatus::Loaded {
        sessions: trace.records.len(),
        blocks: trace.blocks,
        skipped: trace.skipped,
    };
    Ok((FileLoad { direction, path: Some(path.to_path_buf()), status }, trace.records))
}

/// Load both trace files of one node pair.
///
/// # Errors
/// Returns [`AnalyzerError::TraceUnreadable`] if a configured file cannot be
/// read for any reason other than not existing. Missing files are not errors.
pub fn load_pair(pair: &NodePairConfig) -> Result<PairLoad, AnalyzerError> {
    let pair_name = pair.pair_name();
    info!("Processing node pair: {pair_name}");

    let (out_load, mut records) =
        load_direction(pair, &pair_name, Direction::Outgoing, pair.outgoing_file.as_deref())?;
    let (in_load, incoming) =
        load_direction(pair, &pair_name, Direction::Incoming, pair.incoming_file.as_deref())?;
    records.extend(incoming);

    Ok(PairLoad { pair_name, files: vec![out_load, in_load], records })
}

pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Load every configured pair, in configuration order.
    ///
    /// One result per pair; a failing pair does not stop the others, and the
    /// caller decides whether a failure aborts the run.
    #[must_use]
    pub fn load_all(&self) -> Vec<Result<PairLoad, AnalyzerError>> {
        let jobs = self.config.jobs.max(1).min(self.config.node_pairs.len());
        if jobs <= 1 {
            return self.config.node_pairs.iter().map(load_pair).collect();
        }
        self.load_parallel(jobs)
    }

    fn load_parallel(&self, jobs: usize) -> Vec<Result<PairLoad, AnalyzerError>> {
        let pairs = &self.config.node_pairs;
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<usize>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        for idx in 0..pairs.len() {
            // Receiver is alive until the end of this function
            job_tx.send(idx).ok();
        }
        drop(job_tx);

        std::thread::scope(|scope| {
            for _ in 0..jobs {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for idx in job_rx.iter() {
                        if result_tx.send((idx, load_pair(&pairs[idx]))).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<Result<PairLoad, AnalyzerError>>> =
            std::iter::repeat_with(|| None).take(pairs.len()).collect();
        for (idx, result) in result_rx.iter() {
            slots[idx] = Some(result);
        }
        slots.into_iter().flatten().collect()
    }

    /// Match and analyze the records of the successfully loaded pairs.
    ///
    /// Every configured pair is listed in the report, loaded or not.
    #[must_use]
    pub fn analyze(&self, loads: Vec<PairLoad>) -> AnalysisRun {
        let records: Vec<SessionRecord> = loads.into_iter().flat_map(|load| load.records).collect();
        info!("Matching {} sessions across {} node pairs", records.len(), self.config.node_pairs.len());

        let outcome = match_sessions(records);
        let node_pairs: Vec<NodePairInfo> = self.config.node_pairs.iter().map(NodePairInfo::from).collect();
        let report = AnalysisReport::build(
            node_pairs,
            &outcome,
            self.config.processing_delay_us,
            report_timestamp(),
        );

        info!(
            "Analysis completed: {} sessions ({} valid, {} dropped)",
            report.analysis.total_sessions,
            report.analysis.valid_sessions.len(),
            report.analysis.dropped_sessions.len()
        );

        AnalysisRun { report, groups: outcome.groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn trace_path() -> &'static Path {
        Path::new("/data/node1_out.log")
    }

    #[test]
    fn test_not_found_is_missing() {
        let read = Err(io::Error::from(ErrorKind::NotFound));
        let (load, records) = classify_read("n1-n2", Direction::Outgoing, trace_path(), read).unwrap();

        assert_eq!(load.status, FileStatus::Missing);
        assert_eq!(load.path.as_deref(), Some(trace_path()));
        assert!(records.is_empty());
    }

    #[test]
    fn test_permission_denied_is_unreadable() {
        let read = Err(io::Error::from(ErrorKind::PermissionDenied));
        let err = classify_read("n1-n2", Direction::Incoming, trace_path(), read).unwrap_err();

        let AnalyzerError::TraceUnreadable { pair_name, path, source } = err;
        assert_eq!(pair_name, "n1-n2");
        assert_eq!(path, trace_path());
        assert_eq!(source.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_loaded_file_counts() {
        let trace = TraceFile { records: Vec::new(), blocks: 2, skipped: 2 };
        let (load, _) = classify_read("n1-n2", Direction::Outgoing, trace_path(), Ok(trace)).unwrap();
        assert_eq!(load.status, FileStatus::Loaded { sessions: 0, blocks: 2, skipped: 2 });
    }

    #[cfg(unix)]
    #[test]
    fn test_load_pair_unreadable_file_in_locked_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        let trace = locked.join("out.log");
        std::fs::write(&trace, "").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Root bypasses directory permissions
        let blocked = std::fs::read(&trace).is_err();
        let pair = NodePairConfig {
            name: Some("n1-n2".to_string()),
            src_ip: "10.0.0.1".to_string(),
            dst_ip: "10.0.0.2".to_string(),
            outgoing_file: Some(trace),
            incoming_file: None,
        };
        let result = load_pair(&pair);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();

        if blocked {
            assert!(matches!(result, Err(AnalyzerError::TraceUnreadable { .. })));
        } else {
            assert!(result.is_ok());
        }
    }
}
