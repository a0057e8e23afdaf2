//! Line/column coordinates for host-facing output.
//!
//! Analysis stages work in byte offsets (`TextRange`); hosts present and
//! address locations as 0-indexed line/column pairs. [`crate::LineIndex`]
//! converts between the two, and [`Workspace::span`](crate::Workspace::span)
//! exposes the conversion for diagnostic and symbol ranges.

/// A 0-indexed line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A line/column range. `end` is the position just past the last
/// character; `contains` treats it as inside, where a cursor sits when
/// placed at the end of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: Position::new(start_line, start_col),
            end: Position::new(end_line, end_col),
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        if position.line < self.start.line || position.line > self.end.line {
            return false;
        }
        if position.line == self.start.line && position.column < self.start.column {
            return false;
        }
        if position.line == self.end.line && position.column > self.end.column {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains() {
        let span = Span::from_coords(1, 4, 1, 10);
        assert!(span.contains(Position::new(1, 4)));
        assert!(span.contains(Position::new(1, 7)));
        assert!(span.contains(Position::new(1, 10)));
        assert!(!span.contains(Position::new(1, 3)));
        assert!(!span.contains(Position::new(2, 0)));
    }

    #[test]
    fn test_multiline_span_contains() {
        let span = Span::from_coords(2, 8, 5, 1);
        assert!(span.contains(Position::new(3, 0)));
        assert!(span.contains(Position::new(5, 1)));
        assert!(!span.contains(Position::new(5, 2)));
    }
}
