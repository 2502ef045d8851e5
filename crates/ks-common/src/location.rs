use serde::{Deserialize, Serialize};

/// A 1-based line/column pair inside a source context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Where a diagnostic originated: a context (usually a file or module name)
/// plus a start and end position.
///
/// The type engine never interprets locations; it only forwards them into
/// the errors it produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub context: String,
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(context: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            context: context.into(),
            start,
            end,
        }
    }

    /// A location for values synthesized by the compiler itself.
    pub fn no_provided() -> Self {
        Self::default()
    }

    /// Whether this location points at real source text.
    pub fn is_provided(&self) -> bool {
        self.start.line > 0
    }
}

/// Pre-computed index of line start positions.
///
/// Converts between byte offsets and 1-based (line, column) pairs, in both
/// directions. Built once per source text.
#[derive(Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line. The first entry is always 0.
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            line_starts,
            len: source.len() as u32,
        }
    }

    /// Convert a byte offset to a 1-based position.
    pub fn position(&self, offset: u32) -> Position {
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        Position {
            line: line_idx as u32 + 1,
            column: offset - self.line_starts[line_idx] + 1,
        }
    }

    /// Convert a 1-based position back to a byte offset, clamped to the
    /// source length. Line 0 (an unprovided position) maps to offset 0.
    pub fn offset(&self, position: Position) -> u32 {
        if position.line == 0 {
            return 0;
        }
        let Some(&line_start) = self.line_starts.get(position.line as usize - 1) else {
            return self.len;
        };
        (line_start + position.column.saturating_sub(1)).min(self.len)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
