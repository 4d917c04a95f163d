//! Structured error types for rttlens
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Per-block parse failures are not errors: they are counted and skipped.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error(
        "Cannot read trace file {path} for node pair {pair_name}: {source}. \
         Check the path and its permissions, or remove it from the configuration"
    )]
    TraceUnreadable {
        pair_name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported configuration format for {0} (expected .json or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("Configuration defines no node pairs")]
    NoNodePairs,

    #[error("Node pair {index} is missing its {field}")]
    MissingEndpoint { index: usize, field: &'static str },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read analysis report {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
