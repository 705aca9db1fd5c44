//! Position tracking for diagnostics
//!
//! Stores line/column locations alongside byte offsets so that syntax errors
//! can be reported the way editors expect.

/// A span representing a range in source code (0-indexed for LSP compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A position in source code (0-indexed, column counted in chars)
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
        self.start <= position && position <= self.end
    }
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The mutable position of an in-flight parse.
///
/// A cursor is owned by exactly one parse call; backtracking saves a copy and
/// restores it, so the type is `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Cursor {
    /// Cursor at the start of the input.
    pub fn start() -> Self {
        Self::default()
    }

    /// Cursor at `offset` in `text`, with line and column computed from the
    /// preceding text. `offset` is clamped to the text length.
    pub fn at(text: &str, offset: usize) -> Self {
        let mut cursor = Self::start();
        let offset = offset.min(text.len());
        cursor.advance(&text[..floor_char_boundary(text, offset)]);
        cursor.offset = offset;
        cursor
    }

    /// Move past `consumed`, which must be the text directly at the cursor.
    pub fn advance(&mut self, consumed: &str) {
        self.offset += consumed.len();
        match consumed.rfind('\n') {
            Some(newline) => {
                self.line += consumed.matches('\n').count();
                self.column = consumed[newline + 1..].chars().count();
            }
            None => self.column += consumed.chars().count(),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
