//! Analysis configuration
//!
//! A run is described by a list of node pairs, each with up to two trace
//! files. The configuration comes either from a JSON/TOML file or from the
//! single-pair command-line flags.
//!
//! ```json
//! {
//!   "name": "storage_net",
//!   "output_dir": "./reports",
//!   "node_pairs": [
//!     {
//!       "name": "node1-node2",
//!       "src_ip": "192.168.254.31",
//!       "dst_ip": "192.168.254.32",
//!       "outgoing_file": "logs/node1_out.log",
//!       "incoming_file": "logs/node2_in.log"
//!     }
//!   ]
//! }
//! ```

use crate::analysis::DEFAULT_PROCESSING_DELAY_US;
use crate::domain::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Report name used when the configuration does not give one.
pub const DEFAULT_ANALYSIS_NAME: &str = "general_analysis";

fn default_name() -> String {
    DEFAULT_ANALYSIS_NAME.to_string()
}

fn default_processing_delay() -> f64 {
    DEFAULT_PROCESSING_DELAY_US
}

fn default_jobs() -> usize {
    1
}

/// One measured node pair and its trace files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePairConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub src_ip: String,
    pub dst_ip: String,
    #[serde(default)]
    pub outgoing_file: Option<PathBuf>,
    #[serde(default)]
    pub incoming_file: Option<PathBuf>,
}

impl NodePairConfig {
    /// Configured name, or `<src_ip>-><dst_ip>`.
    #[must_use]
    pub fn pair_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.direction())
    }

    /// `<src_ip>-><dst_ip>`
    #[must_use]
    pub fn direction(&self) -> String {
        format!("{}->{}", self.src_ip, self.dst_ip)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Prefix of the report file names.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Processing overhead attached to every bidirectional analysis (µs).
    #[serde(default = "default_processing_delay")]
    pub processing_delay_us: f64,
    /// Worker threads used to load node pairs; 1 loads sequentially.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    #[serde(default)]
    pub node_pairs: Vec<NodePairConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            output_dir: None,
            processing_delay_us: DEFAULT_PROCESSING_DELAY_US,
            jobs: default_jobs(),
            node_pairs: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration file; the format is picked by extension
    /// (`.json`, `.toml`).
    ///
    /// # Errors
    /// Fails if the file cannot be read, has an unknown extension, does not
    /// deserialize, or does not validate.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        let config: Self = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration for a single node pair given on the command line.
    ///
    /// A given `name` names both the run and the pair (unless the pair
    /// already has one); without it the run is `<src_ip>-<dst_ip>`.
    #[must_use]
    pub fn single_pair(mut pair: NodePairConfig, name: Option<String>) -> Self {
        if pair.name.is_none() {
            pair.name.clone_from(&name);
        }
        let name = name.unwrap_or_else(|| format!("{}-{}", pair.src_ip, pair.dst_ip));
        Self { name, node_pairs: vec![pair], ..Self::default() }
    }

    /// Check that at least one pair exists and every pair has both endpoints.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_pairs.is_empty() {
            return Err(ConfigError::NoNodePairs);
        }
        for (index, pair) in self.node_pairs.iter().enumerate() {
            if pair.src_ip.trim().is_empty() {
                return Err(ConfigError::MissingEndpoint { index, field: "src_ip" });
            }
            if pair.dst_ip.trim().is_empty() {
                return Err(ConfigError::MissingEndpoint { index, field: "dst_ip" });
            }
        }
        Ok(())
    }
}
