//! Dim decorations: planning which lines to dim and handing them to the host.
//!
//! The core never renders anything. It computes an ordered list of [`DimRange`]s, one per line,
//! and passes it to a [`DecorationSink`], which replaces whatever it applied before. An empty list
//! clears the dimming.

use crate::document::TextDocument;
use crate::error::FocusError;
use crate::position::{LineRange, Position};
use crate::view::VisibleWindow;
use std::cell::RefCell;
use std::rc::Rc;

/// One dimmed line, covering the whole text of that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimRange {
    /// Logical line index.
    pub line: usize,
    /// Line length in characters (the exclusive end column).
    pub end_column: usize,
}

impl DimRange {
    /// Start of the dimmed span.
    pub fn start(&self) -> Position {
        Position::new(self.line, 0)
    }

    /// End of the dimmed span.
    pub fn end(&self) -> Position {
        Position::new(self.line, self.end_column)
    }

    /// The dimmed line as a single-line range.
    pub fn line_range(&self) -> LineRange {
        LineRange::single(self.line)
    }
}

/// Plan the dim decorations for `window`, leaving `excluded` undimmed.
///
/// Lines are emitted one range per line, in ascending order. Emission stops at the first line
/// the document no longer has (it shrank after the window was computed), so the output is always
/// in bounds but may be partial.
pub fn plan<D>(window: &VisibleWindow, excluded: &LineRange, doc: &D) -> Vec<DimRange>
where
    D: TextDocument + ?Sized,
{
    let Some(range) = window.range() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(range.line_count());
    for line in range.lines() {
        if excluded.contains_line(line) {
            continue;
        }
        let Some(end_column) = doc.line_len(line) else {
            break;
        };
        out.push(DimRange { line, end_column });
    }
    out
}

/// Visual parameters of the dim decoration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimStyle {
    /// Opacity of dimmed text, in `[0, 1]`.
    pub opacity: f64,
}

/// Host-issued handle to a created [`DimStyle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleHandle(pub u64);

/// Where dim decorations end up.
pub trait DecorationSink {
    /// Register a decoration style and return its handle.
    fn create_style(&mut self, style: DimStyle) -> Result<StyleHandle, FocusError>;

    /// Release a style; its decorations disappear with it.
    fn dispose_style(&mut self, handle: StyleHandle);

    /// Replace all decorations of `handle` with `ranges`. An empty slice clears them.
    fn set_decorations(&mut self, handle: StyleHandle, ranges: &[DimRange]);
}

/// A single call received by [`SharedDecorations`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    /// A style was created.
    Create(StyleHandle, DimStyle),
    /// A style was disposed.
    Dispose(StyleHandle),
    /// Decorations were replaced.
    Set(StyleHandle, Vec<DimRange>),
}

#[derive(Debug, Default)]
struct SinkState {
    next_handle: u64,
    styles: Vec<(StyleHandle, DimStyle)>,
    applied: Vec<DimRange>,
    calls: Vec<SinkCall>,
    fail_create: bool,
}

/// An in-memory [`DecorationSink`] that can be cloned and read back.
///
/// All clones share the same state, so a renderer can hold one clone while the controller owns
/// another. Every call is also recorded in order.
#[derive(Debug, Clone, Default)]
pub struct SharedDecorations {
    inner: Rc<RefCell<SinkState>>,
}

impl SharedDecorations {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent [`DecorationSink::create_style`] calls fail.
    pub fn fail_style_creation(&self, fail: bool) {
        self.inner.borrow_mut().fail_create = fail;
    }

    /// Currently applied ranges.
    pub fn applied(&self) -> Vec<DimRange> {
        self.inner.borrow().applied.clone()
    }

    /// Currently applied line indices.
    pub fn dimmed_lines(&self) -> Vec<usize> {
        self.inner.borrow().applied.iter().map(|r| r.line).collect()
    }

    /// Returns true if `line` is currently dimmed.
    pub fn is_dimmed(&self, line: usize) -> bool {
        self.inner.borrow().applied.iter().any(|r| r.line == line)
    }

    /// The live style, if one has been created and not disposed.
    pub fn active_style(&self) -> Option<(StyleHandle, DimStyle)> {
        self.inner.borrow().styles.last().copied()
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<SinkCall> {
        self.inner.borrow().calls.clone()
    }

    /// Number of `set_decorations` calls received so far.
    pub fn set_count(&self) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|call| matches!(call, SinkCall::Set(..)))
            .count()
    }

    /// Forget the recorded call history (applied state is kept).
    pub fn clear_history(&self) {
        self.inner.borrow_mut().calls.clear();
    }
}

impl DecorationSink for SharedDecorations {
    fn create_style(&mut self, style: DimStyle) -> Result<StyleHandle, FocusError> {
        let mut state = self.inner.borrow_mut();
        if state.fail_create {
            return Err(FocusError::Setup("style creation rejected".to_string()));
        }
        state.next_handle += 1;
        let handle = StyleHandle(state.next_handle);
        state.styles.push((handle, style));
        state.calls.push(SinkCall::Create(handle, style));
        Ok(handle)
    }

    fn dispose_style(&mut self, handle: StyleHandle) {
        let mut state = self.inner.borrow_mut();
        let before = state.styles.len();
        state.styles.retain(|(h, _)| *h != handle);
        if state.styles.len() != before {
            state.applied.clear();
        }
        state.calls.push(SinkCall::Dispose(handle));
    }

    fn set_decorations(&mut self, handle: StyleHandle, ranges: &[DimRange]) {
        let mut state = self.inner.borrow_mut();
        state.applied = ranges.to_vec();
        state.calls.push(SinkCall::Set(handle, ranges.to_vec()));
    }
}
