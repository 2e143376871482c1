use tower_lsp_server::ls_types::{Position, Range};

use super::Span;

/// Maps between LSP positions (UTF-16 columns) and byte offsets of one text.
///
/// Line starts are computed once; callers that already hold them (cached
/// documents do) pass them in through [`PositionMapper::with_line_starts`].
pub struct PositionMapper<'a> {
    text: &'a str,
    line_starts: std::borrow::Cow<'a, [usize]>,
}

impl<'a> PositionMapper<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            line_starts: std::borrow::Cow::Owned(compute_line_starts(text)),
        }
    }

    /// Reuse precomputed line starts. They must come from [`compute_line_starts`]
    /// over the same `text`.
    pub fn with_line_starts(text: &'a str, line_starts: &'a [usize]) -> Self {
        Self {
            text,
            line_starts: std::borrow::Cow::Borrowed(line_starts),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte range of `line` excluding its terminator (`\n` or `\r\n`).
    fn line_bounds(&self, line: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line)?;
        let mut end = match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };
        if end > start && self.text.as_bytes()[end - 1] == b'\r' {
            end -= 1;
        }
        Some((start, end))
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// A column past the end of its line clamps to the line end; a line past
    /// the end of the text yields `None`.
    pub fn position_to_byte(&self, position: Position) -> Option<usize> {
        let (line_start, line_end) = self.line_bounds(position.line as usize)?;
        let line_text = &self.text[line_start..line_end];

        match convert_utf16_to_byte_in_line(line_text, position.character as usize) {
            Some(byte_offset) => Some(line_start + byte_offset),
            None => Some(line_end),
        }
    }

    /// Like [`Self::position_to_byte`], but a column past the end of its line
    /// yields `None` instead of clamping.
    pub fn position_to_byte_strict(&self, position: Position) -> Option<usize> {
        let (line_start, line_end) = self.line_bounds(position.line as usize)?;
        let line_text = &self.text[line_start..line_end];
        convert_utf16_to_byte_in_line(line_text, position.character as usize)
            .map(|byte_offset| line_start + byte_offset)
    }

    /// Convert a byte offset to an LSP position.
    ///
    /// An offset inside a multi-byte character snaps back to the character
    /// start. Offsets past the end of the text yield `None`.
    pub fn byte_to_position(&self, offset: usize) -> Option<Position> {
        if offset > self.text.len() {
            return None;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let (line_start, line_end) = self.line_bounds(line)?;
        let line_text = &self.text[line_start..line_end];
        // Offsets between '\r' and '\n' land on the line end.
        let mut column = offset.min(line_end) - line_start;
        while !line_text.is_char_boundary(column) {
            column -= 1;
        }

        let character = convert_byte_to_utf16_in_line(line_text, column)?;
        Some(Position {
            line: line as u32,
            character: character as u32,
        })
    }

    pub fn range_to_span(&self, range: Range) -> Option<Span> {
        let start = self.position_to_byte(range.start)?;
        let end = self.position_to_byte(range.end)?;
        (start <= end).then(|| Span::new(start, end))
    }

    /// Span of `range` only if both ends lie on existing text.
    pub fn range_to_span_strict(&self, range: Range) -> Option<Span> {
        let start = self.position_to_byte_strict(range.start)?;
        let end = self.position_to_byte_strict(range.end)?;
        (start <= end).then(|| Span::new(start, end))
    }

    pub fn span_to_range(&self, span: Span) -> Option<Range> {
        Some(Range {
            start: self.byte_to_position(span.start)?,
            end: self.byte_to_position(span.end)?,
        })
    }

    /// Range covering the whole text.
    pub fn full_range(&self) -> Range {
        let end = self
            .byte_to_position(self.text.len())
            .unwrap_or_else(|| Position::new(0, 0));
        Range::new(Position::new(0, 0), end)
    }
}

/// Compute line start offsets for efficient position mapping
pub fn compute_line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(index, _)| index + 1),
        )
        .collect()
}

/// Convert UTF-16 position to byte position within a line
/// Returns None if the UTF-16 position is beyond the end of the line
#[inline(always)]
pub fn convert_utf16_to_byte_in_line(line_text: &str, utf16_pos: usize) -> Option<usize> {
    let mut byte_offset = 0;
    let mut utf16_offset = 0;

    for ch in line_text.chars() {
        if utf16_offset >= utf16_pos {
            return Some(byte_offset);
        }
        utf16_offset += ch.len_utf16();
        byte_offset += ch.len_utf8();
    }

    (utf16_offset >= utf16_pos).then_some(byte_offset)
}

/// Convert byte position to UTF-16 position within a line
/// Returns None if the byte position is not on a char boundary or beyond the line
#[inline(always)]
pub fn convert_byte_to_utf16_in_line(line_text: &str, byte_pos: usize) -> Option<usize> {
    if !line_text.is_char_boundary(byte_pos) {
        return None;
    }
    Some(line_text[..byte_pos].chars().map(char::len_utf16).sum())
}
