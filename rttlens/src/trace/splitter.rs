//! Splits raw trace content into per-session blocks.

use std::iter::FusedIterator;

/// Line prefix that opens every session block in an RTT trace.
pub const BLOCK_MARKER: &str = "=== ICMP RTT Trace:";

/// Lazy iterator over the blocks that follow each marker occurrence.
///
/// Text before the first marker is discarded. Each yielded block borrows from
/// the content and runs up to (not including) the next marker.
#[derive(Debug, Clone)]
pub struct TraceBlocks<'a> {
    marker: &'a str,
    rest: Option<&'a str>,
}

impl<'a> TraceBlocks<'a> {
    /// Split on [`BLOCK_MARKER`].
    #[must_use]
    pub fn new(content: &'a str) -> Self {
        Self::with_marker(content, BLOCK_MARKER)
    }

    /// Split on a custom marker. An empty marker yields no blocks.
    #[must_use]
    pub fn with_marker(content: &'a str, marker: &'a str) -> Self {
        let rest = if marker.is_empty() {
            None
        } else {
            content.find(marker).map(|pos| &content[pos + marker.len()..])
        };
        Self { marker, rest }
    }
}

impl<'a> Iterator for TraceBlocks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.take()?;
        match rest.find(self.marker) {
            Some(pos) => {
                self.rest = Some(&rest[pos + self.marker.len()..]);
                Some(&rest[..pos])
            }
            None => Some(rest),
        }
    }
}

impl FusedIterator for TraceBlocks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_yields_no_blocks() {
        assert_eq!(TraceBlocks::new("").count(), 0);
    }

    #[test]
    fn test_content_without_marker_yields_no_blocks() {
        assert_eq!(TraceBlocks::new("just some preamble\nno traces here\n").count(), 0);
    }

    #[test]
    fn test_preamble_is_discarded() {
        let content = "tool v1.2 starting\n=== ICMP RTT Trace: A ===\nbody a\n=== ICMP RTT Trace: B ===\nbody b\n";
        let blocks: Vec<&str> = TraceBlocks::new(content).collect();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], " A ===\nbody a\n");
        assert_eq!(blocks[1], " B ===\nbody b\n");
    }

    #[test]
    fn test_adjacent_markers_yield_empty_block() {
        let blocks: Vec<&str> = TraceBlocks::with_marker("#x##y", "#").collect();
        assert_eq!(blocks, vec!["x", "", "y"]);
    }

    #[test]
    fn test_empty_marker_yields_nothing() {
        assert_eq!(TraceBlocks::with_marker("abc", "").count(), 0);
    }

    #[test]
    fn test_iterator_is_fused() {
        let mut blocks = TraceBlocks::with_marker("#a", "#");
        assert_eq!(blocks.next(), Some("a"));
        assert_eq!(blocks.next(), None);
        assert_eq!(blocks.next(), None);
    }
}
