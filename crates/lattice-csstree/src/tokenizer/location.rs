//! Offset to line/column translation.

use std::cell::OnceCell;

use serde::{Deserialize, Serialize};

use super::char_code::is_bom;

/// A point in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset (including any configured start offset).
    pub offset: usize,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, counted in characters).
    pub column: usize,
}

/// A source range attached to a CST node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loc {
    /// File name the range belongs to.
    pub source: String,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug)]
struct Table {
    lines: Vec<usize>,
    columns: Vec<usize>,
}

/// Maps byte offsets to positions.
///
/// The line/column table is built on first use with a single forward scan
/// and shared by every lookup afterwards.
#[derive(Debug)]
pub struct OffsetToLocation<'s> {
    source: &'s str,
    start_offset: usize,
    start_line: usize,
    start_column: usize,
    table: OnceCell<Table>,
}

impl<'s> OffsetToLocation<'s> {
    /// Create a mapper for `source` with the default bias (offset 0, line 1,
    /// column 1).
    pub fn new(source: &'s str) -> Self {
        Self::with_bias(source, 0, 1, 1)
    }

    /// Create a mapper for a fragment embedded at the given position.
    pub fn with_bias(source: &'s str, start_offset: usize, start_line: usize, start_column: usize) -> Self {
        Self {
            source,
            start_offset,
            start_line,
            start_column,
            table: OnceCell::new(),
        }
    }

    /// Offset bias added to every reported offset.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    fn table(&self) -> &Table {
        self.table.get_or_init(|| {
            let bytes = self.source.as_bytes();
            let length = bytes.len();
            let mut lines = vec![0; length + 1];
            let mut columns = vec![0; length + 1];
            let mut line = self.start_line;
            let mut column = self.start_column;
            let mut i = if is_bom(bytes) { 3 } else { 0 };

            for j in 0..i.min(length) {
                lines[j] = line;
                columns[j] = column;
            }

            while i < length {
                let code = bytes[i];
                lines[i] = line;
                columns[i] = column;

                // continuation bytes share the column of their lead byte
                if !(0x80..0xC0).contains(&code) {
                    column += 1;
                } else {
                    columns[i] = column - 1;
                }

                if code == b'\n' || code == b'\r' || code == 0x0C {
                    if code == b'\r' && i + 1 < length && bytes[i + 1] == b'\n' {
                        i += 1;
                        lines[i] = line;
                        columns[i] = column;
                    }

                    line += 1;
                    column = 1;
                }

                i += 1;
            }

            lines[length] = line;
            columns[length] = column;

            Table { lines, columns }
        })
    }

    /// Position of a byte offset relative to the source start.
    pub fn position(&self, offset: usize) -> Position {
        let table = self.table();
        let offset = offset.min(self.source.len());

        Position {
            offset: self.start_offset + offset,
            line: table.lines[offset],
            column: table.columns[offset],
        }
    }

    /// Range between two byte offsets.
    pub fn location_range(&self, start: usize, end: usize, filename: &str) -> Loc {
        Loc {
            source: filename.to_string(),
            start: self.position(start),
            end: self.position(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_lines_and_columns() {
        let map = OffsetToLocation::new("a\nbc\r\nd");

        assert_eq!(map.position(0), Position { offset: 0, line: 1, column: 1 });
        assert_eq!(map.position(1), Position { offset: 1, line: 1, column: 2 });
        assert_eq!(map.position(2), Position { offset: 2, line: 2, column: 1 });
        assert_eq!(map.position(6), Position { offset: 6, line: 3, column: 1 });
        assert_eq!(map.position(7), Position { offset: 7, line: 3, column: 2 });
    }

    #[test]
    fn applies_bias() {
        let map = OffsetToLocation::with_bias("a\nb", 100, 3, 5);

        assert_eq!(map.position(0), Position { offset: 100, line: 3, column: 5 });
        assert_eq!(map.position(2), Position { offset: 102, line: 4, column: 1 });
    }

    #[test]
    fn counts_columns_in_characters() {
        let map = OffsetToLocation::new("\u{e9}a");

        assert_eq!(map.position(2).column, 2);
        assert_eq!(map.position(3).column, 3);
    }

    #[test]
    fn builds_ranges() {
        let map = OffsetToLocation::new("abc");
        let loc = map.location_range(1, 3, "test.css");

        assert_eq!(loc.source, "test.css");
        assert_eq!(loc.start.column, 2);
        assert_eq!(loc.end.column, 4);
    }
}
