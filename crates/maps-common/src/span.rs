use std::fmt;

use serde::Serialize;

/// Byte-offset span into source text. Start is inclusive, end is exclusive.
///
/// Every expression, definition and diagnostic in the Maps compiler carries
/// one of these. Line/column pairs are derived on demand with
/// [`SourceLocation::from_offset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// Zero-width span used for builtins and synthesized nodes.
    pub fn synthetic() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A 1-based line/column position.
///
/// Ordered by line first, then column, so a `BTreeMap` keyed on locations
/// iterates in source order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Compute the line/column of a byte offset in `source`.
    ///
    /// Offsets past the end of the source map to the position just after the
    /// last character. Columns count bytes.
    pub fn from_offset(source: &str, offset: u32) -> Self {
        let offset = (offset as usize).min(source.len());
        let before = &source.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() as u32 + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        Self {
            line,
            column: (offset - line_start) as u32 + 1,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_merge_covers_both() {
        let a = Span::new(4, 9);
        let b = Span::new(1, 6);
        assert_eq!(a.merge(b), Span::new(1, 9));
        assert_eq!(b.merge(a), Span::new(1, 9));
    }

    #[test]
    fn span_len_and_empty() {
        assert_eq!(Span::new(3, 10).len(), 7);
        assert!(Span::synthetic().is_empty());
        assert!(!Span::new(0, 1).is_empty());
    }

    #[test]
    fn location_from_offset() {
        let src = "let x = 1\nlet y = x + 2\n";
        assert_eq!(SourceLocation::from_offset(src, 0), SourceLocation::new(1, 1));
        assert_eq!(SourceLocation::from_offset(src, 4), SourceLocation::new(1, 5));
        // first byte of the second line
        assert_eq!(SourceLocation::from_offset(src, 10), SourceLocation::new(2, 1));
        assert_eq!(SourceLocation::from_offset(src, 18), SourceLocation::new(2, 9));
    }

    #[test]
    fn location_past_end_is_clamped() {
        let src = "ab";
        assert_eq!(SourceLocation::from_offset(src, 50), SourceLocation::new(1, 3));
    }

    #[test]
    fn locations_order_by_line_then_column() {
        assert!(SourceLocation::new(1, 40) < SourceLocation::new(2, 1));
        assert!(SourceLocation::new(3, 2) < SourceLocation::new(3, 7));
        assert_eq!(SourceLocation::new(5, 5).to_string(), "5:5");
    }
}
