//! The active view as seen by the core: document, selection and viewport.

use crate::document::{DocumentSnapshot, TextDocument};
use crate::position::{LineRange, Selection};
use std::cell::RefCell;
use std::rc::Rc;

/// Snapshot of the editor view the focus is computed for.
#[derive(Debug, Clone)]
pub struct ActiveView {
    /// Document shown in the view.
    pub document: DocumentSnapshot,
    /// Primary selection.
    pub selection: Selection,
    /// Rendered line spans, top to bottom. Split or folded views may report several.
    pub visible_ranges: Vec<LineRange>,
}

impl ActiveView {
    /// Create a view snapshot.
    pub fn new(
        document: DocumentSnapshot,
        selection: Selection,
        visible_ranges: Vec<LineRange>,
    ) -> Self {
        Self {
            document,
            selection,
            visible_ranges,
        }
    }

    /// First visible line, if anything is visible.
    pub fn top_line(&self) -> Option<usize> {
        self.visible_ranges.iter().map(|r| r.start_line).min()
    }

    /// Returns true if the caret line is inside one of the visible ranges.
    pub fn cursor_visible(&self) -> bool {
        let line = self.selection.active.line;
        self.visible_ranges.iter().any(|r| r.contains_line(line))
    }

    /// Visible window extended by `buffer_lines`, see [`VisibleWindow::compute`].
    pub fn visible_window(&self, buffer_lines: usize) -> VisibleWindow {
        VisibleWindow::compute(
            &self.visible_ranges,
            buffer_lines,
            self.document.line_count(),
        )
    }
}

/// Host access to the currently active view.
pub trait ViewProvider {
    /// The active view, or `None` when no text editor is focused.
    fn active_view(&self) -> Option<ActiveView>;
}

/// A [`ViewProvider`] whose view can be replaced from outside.
///
/// Clones share the same view, so the host keeps one clone to update while the controller reads
/// through another.
#[derive(Debug, Clone, Default)]
pub struct SharedView {
    inner: Rc<RefCell<Option<ActiveView>>>,
}

impl SharedView {
    /// Create a provider showing `view`.
    pub fn new(view: ActiveView) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Some(view))),
        }
    }

    /// Replace the active view.
    pub fn set(&self, view: ActiveView) {
        *self.inner.borrow_mut() = Some(view);
    }

    /// Remove the active view (no editor focused).
    pub fn clear(&self) {
        *self.inner.borrow_mut() = None;
    }

    /// Modify the active view in place, if there is one.
    pub fn update(&self, f: impl FnOnce(&mut ActiveView)) {
        if let Some(view) = self.inner.borrow_mut().as_mut() {
            f(view);
        }
    }
}

impl ViewProvider for SharedView {
    fn active_view(&self) -> Option<ActiveView> {
        self.inner.borrow().clone()
    }
}

/// The lines eligible for dimming: the visible span plus a buffer above and below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleWindow {
    range: Option<LineRange>,
}

impl VisibleWindow {
    /// A window covering exactly `range`.
    pub fn new(range: LineRange) -> Self {
        Self { range: Some(range) }
    }

    /// A window with no lines.
    pub fn empty() -> Self {
        Self { range: None }
    }

    /// Combine `visible_ranges` (first start to last end), extend by `buffer_lines` on both
    /// sides and clamp into a document of `line_count` lines.
    pub fn compute(visible_ranges: &[LineRange], buffer_lines: usize, line_count: usize) -> Self {
        let (Some(first), Some(last)) = (visible_ranges.first(), visible_ranges.last()) else {
            return Self::empty();
        };
        let start = first.start_line.saturating_sub(buffer_lines);
        let end = last.end_line.saturating_add(buffer_lines);
        Self {
            range: LineRange::new(start, end).clamp_to(line_count),
        }
    }

    /// The window's line range, if non-empty.
    pub fn range(&self) -> Option<LineRange> {
        self.range
    }

    /// Returns true if the window has no lines.
    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }

    /// Number of lines in the window.
    pub fn line_count(&self) -> usize {
        self.range.map_or(0, |r| r.line_count())
    }

    /// Returns true if the window fits in a document of `line_count` lines.
    pub fn fits(&self, line_count: usize) -> bool {
        self.range.is_none_or(|r| r.fits(line_count))
    }
}
