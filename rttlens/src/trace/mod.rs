//! Trace file reading
//!
//! - `splitter`: cut raw content into session blocks on the block marker
//! - `parser`: turn one block into a [`SessionRecord`](crate::trace_data::SessionRecord)

pub mod parser;
pub mod splitter;

pub use parser::parse_session_block;
pub use splitter::{TraceBlocks, BLOCK_MARKER};
