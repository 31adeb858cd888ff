//! Document snapshots.
//!
//! The focus algorithms only need line-level access to a document: how many lines it has, the
//! text of a line, and whether a line is blank. [`TextDocument`] captures that, and
//! [`DocumentSnapshot`] is the rope-backed implementation hosts normally hand to the core.

use ropey::{Rope, RopeSlice};
use std::borrow::Cow;

/// Identity of an open document, stable across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

/// Line-oriented read access to a document.
pub trait TextDocument {
    /// Number of logical lines. Editors report at least one line even for empty text.
    fn line_count(&self) -> usize;

    /// Text of `line` without its line terminator, or `None` if the line does not exist.
    fn line_text(&self, line: usize) -> Option<Cow<'_, str>>;

    /// Length of `line` in characters, excluding the line terminator.
    fn line_len(&self, line: usize) -> Option<usize> {
        self.line_text(line).map(|text| text.chars().count())
    }

    /// Returns `Some(true)` if `line` is empty or whitespace-only.
    fn is_blank(&self, line: usize) -> Option<bool> {
        self.line_text(line)
            .map(|text| text.chars().all(char::is_whitespace))
    }
}

/// An immutable, cheaply clonable view of a document at one version.
///
/// Cloning shares the underlying rope, so snapshots can be captured per refresh cycle and held
/// across suspension points.
///
/// Lines are split the way ropey splits them: besides LF, CRLF and CR, vertical tab, form feed,
/// NEL, U+2028 and U+2029 also end a line. Hosts that number lines on `\n` alone must build the
/// snapshot from text with those characters already replaced, or line indices will not match.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    id: DocumentId,
    version: u64,
    rope: Rope,
}

impl DocumentSnapshot {
    /// Build a snapshot from text.
    pub fn from_text(id: DocumentId, version: u64, text: &str) -> Self {
        Self {
            id,
            version,
            rope: Rope::from_str(text),
        }
    }

    /// Build a snapshot from an existing rope.
    pub fn from_rope(id: DocumentId, version: u64, rope: Rope) -> Self {
        Self { id, version, rope }
    }

    /// Document identity.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Document version this snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The underlying rope.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    fn line_slice(&self, line: usize) -> Option<RopeSlice<'_>> {
        if line >= self.rope.len_lines() {
            return None;
        }
        Some(trim_line_ending(self.rope.line(line)))
    }
}

impl TextDocument for DocumentSnapshot {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_text(&self, line: usize) -> Option<Cow<'_, str>> {
        self.line_slice(line).map(Cow::from)
    }

    fn line_len(&self, line: usize) -> Option<usize> {
        self.line_slice(line).map(|slice| slice.len_chars())
    }

    fn is_blank(&self, line: usize) -> Option<bool> {
        self.line_slice(line)
            .map(|slice| slice.chars().all(char::is_whitespace))
    }
}

// Rope's line() includes its terminator: any single break char, or a CRLF pair.
fn trim_line_ending(slice: RopeSlice<'_>) -> RopeSlice<'_> {
    let mut end = slice.len_chars();
    if end == 0 {
        return slice;
    }
    let last = slice.char(end - 1);
    if is_line_break(last) {
        end -= 1;
        if last == '\n' && end > 0 && slice.char(end - 1) == '\r' {
            end -= 1;
        }
    }
    slice.slice(..end)
}

// Matches ropey's `unicode_lines` break set.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

impl TextDocument for [&str] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line_text(&self, line: usize) -> Option<Cow<'_, str>> {
        self.get(line).map(|text| Cow::Borrowed(*text))
    }
}
