//! Core types used throughout the project.

use tower_lsp::lsp_types;

/// A range in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl From<lsp_types::Range> for SourceRange {
    fn from(range: lsp_types::Range) -> Self {
        Self { start: range.start.into(), end: range.end.into() }
    }
}

impl From<SourceRange> for lsp_types::Range {
    fn from(range: SourceRange) -> Self {
        Self { start: range.start.into(), end: range.end.into() }
    }
}

/// A position in source code (0-indexed, UTF-16 columns as in LSP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SourcePosition {
    pub line: u32,
    pub character: u32,
}

impl From<lsp_types::Position> for SourcePosition {
    fn from(position: lsp_types::Position) -> Self {
        Self { line: position.line, character: position.character }
    }
}

impl From<SourcePosition> for lsp_types::Position {
    fn from(position: SourcePosition) -> Self {
        Self { line: position.line, character: position.character }
    }
}

impl SourceRange {
    #[must_use]
    pub const fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Checks if a position is within this range.
    #[must_use]
    pub const fn contains(&self, position: SourcePosition) -> bool {
        if position.line < self.start.line {
            return false;
        }
        if position.line == self.start.line && position.character < self.start.character {
            return false;
        }
        if position.line > self.end.line {
            return false;
        }
        if position.line == self.end.line && position.character > self.end.character {
            return false;
        }
        true
    }
}

/// Maps byte offsets of a document to LSP positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset at which each line starts.
    line_starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(offset, _)| offset + 1));
        Self { line_starts }
    }

    /// Converts a byte offset into a position.
    ///
    /// Offsets past the end of `text` clamp to the end of the document, and
    /// offsets inside a multi-byte character resolve to that character's start.
    #[must_use]
    pub fn position(&self, text: &str, offset: usize) -> SourcePosition {
        let offset = offset.min(text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset).saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);

        let character: usize = text
            .get(line_start..)
            .unwrap_or_default()
            .char_indices()
            .take_while(|(index, _)| line_start + index < offset)
            .map(|(_, c)| c.len_utf16())
            .sum();

        SourcePosition {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            character: u32::try_from(character).unwrap_or(u32::MAX),
        }
    }

    /// Converts a byte range into a [`SourceRange`].
    #[must_use]
    pub fn range(&self, text: &str, start: usize, end: usize) -> SourceRange {
        SourceRange { start: self.position(text, start), end: self.position(text, end) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    const fn pos(line: u32, character: u32) -> SourcePosition {
        SourcePosition { line, character }
    }

    const fn range(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> SourceRange {
        SourceRange { start: pos(start_line, start_char), end: pos(end_line, end_char) }
    }

    #[rstest]
    #[case::before_start_line(pos(0, 5), range(1, 5, 2, 10), false)]
    #[case::before_start_char(pos(1, 4), range(1, 5, 2, 10), false)]
    #[case::at_start(pos(1, 5), range(1, 5, 2, 10), true)]
    #[case::middle_line(pos(1, 10), range(1, 5, 2, 10), true)]
    #[case::at_end(pos(2, 10), range(1, 5, 2, 10), true)]
    #[case::after_end_char(pos(2, 11), range(1, 5, 2, 10), false)]
    #[case::after_end_line(pos(3, 0), range(1, 5, 2, 10), false)]
    fn test_contains(
        #[case] position: SourcePosition,
        #[case] range: SourceRange,
        #[case] expected: bool,
    ) {
        assert_that!(range.contains(position), eq(expected));
    }

    #[rstest]
    #[case::start_of_document(0, pos(0, 0))]
    #[case::inside_first_line(3, pos(0, 3))]
    #[case::newline_char(5, pos(0, 5))]
    #[case::start_of_second_line(6, pos(1, 0))]
    #[case::past_end(100, pos(1, 5))]
    fn test_line_index_position(#[case] offset: usize, #[case] expected: SourcePosition) {
        let text = "hello\nworld";
        let index = LineIndex::new(text);

        assert_that!(index.position(text, offset), eq(expected));
    }

    #[googletest::test]
    fn test_line_index_counts_utf16_units() {
        // "é" is 2 bytes / 1 UTF-16 unit, "😀" is 4 bytes / 2 UTF-16 units
        let text = "é😀x";
        let index = LineIndex::new(text);

        expect_that!(index.position(text, 2), eq(pos(0, 1)));
        expect_that!(index.position(text, 6), eq(pos(0, 3)));
        expect_that!(index.position(text, 7), eq(pos(0, 4)));
    }

    #[googletest::test]
    fn test_line_index_range() {
        let text = "<a>\n  <b/>\n</a>";
        let index = LineIndex::new(text);

        expect_that!(index.range(text, 6, 10), eq(range(1, 2, 1, 6)));
    }
}
