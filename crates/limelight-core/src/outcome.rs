//! What a refresh cycle ended up doing.
//!
//! Controllers report every decision as a value so hosts and tests can observe it without
//! scraping logs.

use crate::resolver::FocusStrategy;

/// Why dimming was cleared instead of computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    /// Focus highlighting is toggled off.
    Disabled,
    /// The user is scrolling fast, or scrolled the caret out of view.
    FastScroll,
    /// `onlyInZenMode` is set and zen mode is not active.
    ZenGate,
    /// There is no active text view.
    NoView,
    /// The document has no lines.
    EmptyDocument,
}

/// Why a computed result was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// A newer refresh was started (or state changed) while this one was in flight.
    Superseded,
    /// The active document is no longer the one the refresh started with.
    DocumentChanged,
    /// The visible window no longer fits the document.
    WindowOutOfBounds,
    /// The focus region no longer fits the document.
    RegionOutOfBounds,
}

/// The result of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Dim decorations were applied.
    Applied {
        /// The focused (undimmed) region.
        focus: crate::position::LineRange,
        /// Strategy that produced the focus region.
        strategy: FocusStrategy,
        /// Number of dimmed lines handed to the sink.
        dimmed: usize,
    },
    /// Dimming was cleared.
    Cleared(ClearReason),
    /// The computation was discarded; the sink was not touched.
    Discarded(StaleReason),
    /// Nothing was applied yet; the scroll debounce is still running or settled with the caret
    /// out of view.
    Deferred,
}

impl RefreshOutcome {
    /// Returns true if decorations were applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
