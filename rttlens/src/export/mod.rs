//! Report output
//!
//! - `json_report`: analysis and summary documents on disk
//! - `console`: the human-readable run summary

pub mod console;
pub mod json_report;

pub use console::{format_latency, print_summary};
pub use json_report::{
    analysis_file_path, load_analysis, save_analysis, save_summary, summary_file_path,
    summary_path_for,
};
