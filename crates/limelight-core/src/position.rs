//! Logical coordinates: positions, selections and inclusive line ranges.

use std::cmp::Ordering;

/// Logical position in a document (line and column, both zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl Position {
    /// Create a new logical position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Primary selection of a view.
///
/// `anchor` is where the selection was started and `active` is where the caret currently is.
/// Both may be in either order; use [`Selection::start`] / [`Selection::end`] for the
/// document-ordered bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Fixed end of the selection.
    pub anchor: Position,
    /// Moving end of the selection (the caret).
    pub active: Position,
}

impl Selection {
    /// Create a selection from an anchor and an active position.
    pub fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    /// An empty selection (caret only) at `position`.
    pub fn caret(position: Position) -> Self {
        Self::new(position, position)
    }

    /// The earlier of the two ends.
    pub fn start(&self) -> Position {
        self.anchor.min(self.active)
    }

    /// The later of the two ends.
    pub fn end(&self) -> Position {
        self.anchor.max(self.active)
    }

    /// Returns true if the selection is a bare caret.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    /// The lines touched by the selection.
    pub fn line_range(&self) -> LineRange {
        LineRange::new(self.start().line, self.end().line)
    }
}

/// An inclusive range of logical lines (`start_line..=end_line`).
///
/// Invariant: `start_line <= end_line`. Constructors normalize the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    /// First line of the range (inclusive).
    pub start_line: usize,
    /// Last line of the range (inclusive).
    pub end_line: usize,
}

impl LineRange {
    /// Create a new line range; the bounds are swapped if given in reverse.
    pub fn new(start_line: usize, end_line: usize) -> Self {
        if start_line <= end_line {
            Self {
                start_line,
                end_line,
            }
        } else {
            Self {
                start_line: end_line,
                end_line: start_line,
            }
        }
    }

    /// A range covering exactly one line.
    pub fn single(line: usize) -> Self {
        Self {
            start_line: line,
            end_line: line,
        }
    }

    /// Number of lines in the range (always at least 1).
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    /// Returns true if `line` lies within the range.
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Returns the overlap of two ranges, if any.
    pub fn intersect(&self, other: &LineRange) -> Option<LineRange> {
        let start = self.start_line.max(other.start_line);
        let end = self.end_line.min(other.end_line);
        (start <= end).then(|| LineRange::new(start, end))
    }

    /// The smallest range covering both `self` and `other`.
    pub fn cover(&self, other: &LineRange) -> LineRange {
        LineRange::new(
            self.start_line.min(other.start_line),
            self.end_line.max(other.end_line),
        )
    }

    /// Clamp the range into `0..line_count`.
    ///
    /// Returns `None` for an empty document.
    pub fn clamp_to(&self, line_count: usize) -> Option<LineRange> {
        let last = line_count.checked_sub(1)?;
        Some(LineRange::new(
            self.start_line.min(last),
            self.end_line.min(last),
        ))
    }

    /// Returns true if the whole range fits in a document with `line_count` lines.
    pub fn fits(&self, line_count: usize) -> bool {
        self.end_line < line_count
    }

    /// Iterate the line indices of the range in ascending order.
    pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
        self.start_line..=self.end_line
    }
}
