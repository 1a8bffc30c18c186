//! Span and byte offset types for source positions.

use serde::{Deserialize, Serialize};
use text_size::TextSize;

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A half-open range `[start, end)` of byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// The start byte offset (inclusive).
    pub start: ByteOffset,
    /// The end byte offset (exclusive).
    pub end: ByteOffset,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Creates a span from `usize` offsets, ordering them if reversed.
    pub fn from_offsets(start: usize, end: usize) -> Self {
        let (start, end) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };
        Self::new(offset(start), offset(end))
    }

    /// Returns the length of this span in bytes.
    #[inline]
    pub fn len(&self) -> TextSize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

fn offset(value: usize) -> ByteOffset {
    TextSize::from(u32::try_from(value).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_from_offsets_orders() {
        let span = Span::from_offsets(10, 4);
        assert_eq!(span.start, TextSize::from(4));
        assert_eq!(span.end, TextSize::from(10));
        assert_eq!(span.len(), TextSize::from(6));
    }

    #[test]
    fn test_empty_span() {
        assert!(Span::new(3u32, 3u32).is_empty());
        assert!(!Span::from_offsets(3, 4).is_empty());
    }
}
