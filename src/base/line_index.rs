//! Byte-offset to line/column conversion.

use text_size::{TextRange, TextSize};

use super::{Position, Span};

/// Precomputed newline positions for a single file's text.
///
/// Built once per revision of a file; all diagnostics and navigation
/// queries for that revision convert through the same index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line. Always contains at least 0.
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Convert a byte offset to a 0-indexed line/column position.
    ///
    /// Offsets past the end of the text clamp to the last position.
    pub fn position(&self, offset: TextSize) -> Position {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line];
        Position::new(line as u32, u32::from(offset - line_start))
    }

    /// Convert a byte range to a line/column span.
    pub fn span(&self, range: TextRange) -> Span {
        Span::new(self.position(range.start()), self.position(range.end()))
    }

    /// Convert a line/column position back to a byte offset.
    ///
    /// Returns `None` if the line does not exist; columns past the end of
    /// a line clamp to the start of the next line (or end of text).
    pub fn offset(&self, position: Position) -> Option<TextSize> {
        let line_start = *self.line_starts.get(position.line as usize)?;
        let line_end = self
            .line_starts
            .get(position.line as usize + 1)
            .copied()
            .unwrap_or(self.len);
        Some((line_start + TextSize::new(position.column)).min(line_end))
    }

    /// Number of lines in the indexed text.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("hello");
        assert_eq!(index.position(TextSize::new(0)), Position::new(0, 0));
        assert_eq!(index.position(TextSize::new(3)), Position::new(0, 3));
        assert_eq!(index.line_count(), 1);
    }

    #[test]
    fn test_multi_line() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.position(TextSize::new(0)), Position::new(0, 0));
        assert_eq!(index.position(TextSize::new(3)), Position::new(1, 0));
        assert_eq!(index.position(TextSize::new(4)), Position::new(1, 1));
        assert_eq!(index.position(TextSize::new(6)), Position::new(2, 0));
        assert_eq!(index.position(TextSize::new(7)), Position::new(3, 0));
    }

    #[test]
    fn test_offset_roundtrip() {
        let text = "module a;\nstruct B {\n}\n";
        let index = LineIndex::new(text);
        for offset in 0..text.len() as u32 {
            let offset = TextSize::new(offset);
            let pos = index.position(offset);
            assert_eq!(index.offset(pos), Some(offset));
        }
    }

    #[test]
    fn test_offset_clamps_past_line_end() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset(Position::new(0, 99)), Some(TextSize::new(3)));
        assert_eq!(index.offset(Position::new(9, 0)), None);
    }

    #[test]
    fn test_position_clamps_past_eof() {
        let index = LineIndex::new("ab");
        assert_eq!(index.position(TextSize::new(99)), Position::new(0, 2));
    }
}
