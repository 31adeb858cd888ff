//! LSP coordinate conversion.
//!
//! LSP positions count columns in UTF-16 code units; the core counts characters. The converter
//! bridges the two using the line text of the document snapshot the payload refers to.

use limelight_core::{Position, TextDocument};

/// LSP Position (based on UTF-16 code units)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspPosition {
    /// Line number (0-based)
    pub line: u32,
    /// Character offset (UTF-16 code units, 0-based)
    pub character: u32,
}

impl LspPosition {
    /// Create a new LSP position (UTF-16 based).
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// LSP Range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspRange {
    /// Range start position.
    pub start: LspPosition,
    /// Range end position.
    pub end: LspPosition,
}

impl LspRange {
    /// Create a new LSP range.
    pub fn new(start: LspPosition, end: LspPosition) -> Self {
        Self { start, end }
    }
}

/// LSP coordinate converter
pub struct LspCoordinateConverter;

impl LspCoordinateConverter {
    /// Convert character offset to UTF-16 code unit offset
    pub fn char_offset_to_utf16(text: &str, char_offset: usize) -> usize {
        text.chars().take(char_offset).map(char::len_utf16).sum()
    }

    /// Convert UTF-16 code unit offset to character offset.
    ///
    /// An offset pointing into the middle of a surrogate pair rounds up to the next character;
    /// offsets past the end of the line clamp to the line length.
    pub fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
        let mut current_utf16 = 0;
        let mut char_count = 0;

        for ch in text.chars() {
            if current_utf16 >= utf16_offset {
                break;
            }
            current_utf16 += ch.len_utf16();
            char_count += 1;
        }

        char_count
    }

    /// Convert a logical position to an LSP position.
    pub fn position_to_lsp<D>(doc: &D, position: Position) -> LspPosition
    where
        D: TextDocument + ?Sized,
    {
        let line_text = doc.line_text(position.line).unwrap_or_default();
        let utf16 = Self::char_offset_to_utf16(&line_text, position.column);
        LspPosition::new(saturating_u32(position.line), saturating_u32(utf16))
    }

    /// Convert an LSP position to a logical position.
    ///
    /// Lines the document does not have keep their index with column 0; callers bounds-check
    /// the result against the document they apply it to.
    pub fn lsp_to_position<D>(doc: &D, position: LspPosition) -> Position
    where
        D: TextDocument + ?Sized,
    {
        let line = position.line as usize;
        let column = doc.line_text(line).map_or(0, |text| {
            Self::utf16_to_char_offset(&text, position.character as usize)
        });
        Position::new(line, column)
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
