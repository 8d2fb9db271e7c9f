/// Position tracking for diagnostics
///
/// The parser works in byte offsets ([`TextRange`]); tools that report errors
/// to people convert them to line/column positions through a [`LineIndex`].
use text_size::{TextRange, TextSize};

/// A span representing a range in source code (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A position in source code (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Check if a position falls within this span
    pub fn contains(&self, position: Position) -> bool {
        position >= self.start && position <= self.end
    }
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Maps byte offsets of one source text to line/column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset at which each line starts; always begins with 0.
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::new(offset as u32 + 1));
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a line/column position.
    /// Columns count bytes from the start of the line.
    pub fn position(&self, offset: TextSize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = u32::from(offset - self.line_starts[line]) as usize;
        Position::new(line, column)
    }

    /// Convert a byte range to a line/column span.
    pub fn span(&self, range: TextRange) -> Span {
        Span::new(self.position(range.start()), self.position(range.end()))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_on_first_line() {
        let index = LineIndex::new("prm a 1");
        assert_eq!(index.position(TextSize::new(4)), Position::new(0, 4));
    }

    #[test]
    fn test_position_after_newlines() {
        let index = LineIndex::new("prm a 1\n\nsite O1 x 0");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.position(TextSize::new(9)), Position::new(2, 0));
        assert_eq!(index.position(TextSize::new(14)), Position::new(2, 5));
    }

    #[test]
    fn test_span_contains() {
        let index = LineIndex::new("a\nbc\n");
        let span = index.span(TextRange::new(TextSize::new(0), TextSize::new(4)));
        assert!(span.contains(Position::new(1, 1)));
        assert!(!span.contains(Position::new(2, 0)));
    }
}
