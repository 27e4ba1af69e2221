//! Source location tracking.
//!
//! Every AST node has a `Span` (byte offsets) and, when requested, a
//! `SourceLocation` with 1-based lines and 0-based columns.

use serde::Serialize;

/// A span in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the start.
    pub start: u32,
    /// Byte offset of the end (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at a position.
    #[inline]
    pub const fn empty(pos: u32) -> Self {
        Self { start: pos, end: pos }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span fully covers another one.
    #[inline]
    pub const fn covers(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The `[start, end]` pair used by the `range` property.
    #[inline]
    pub const fn range(&self) -> [u32; 2] {
        [self.start, self.end]
    }
}

/// A line/column pair. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// The `loc` property of nodes, comments and tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A bookmark taken in the token stream: byte index plus line/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Marker {
    pub index: usize,
    pub line: u32,
    pub column: u32,
}

impl Marker {
    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Start and end of a finished node or comment, reported to delegates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metadata {
    pub start: MetaPosition,
    pub end: MetaPosition,
}

/// Position with its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetaPosition {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl From<Marker> for MetaPosition {
    fn from(marker: Marker) -> Self {
        Self {
            line: marker.line,
            column: marker.column,
            offset: marker.index,
        }
    }
}
