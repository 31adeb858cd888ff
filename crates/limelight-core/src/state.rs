//! Focus state holder.
//!
//! Everything that outlives a single refresh cycle lives here: the enabled/scrolling mode, the
//! zen-mode proxy flag, the scroll tracker, the pending debounce deadline and the refresh
//! generation. State changes only through the transition methods below.

use crate::config::FocusConfig;
use crate::outcome::ClearReason;
use crate::scroll::{ScrollSample, ScrollVelocityTracker};
use tokio::time::Instant;

/// Top-level mode of the focus state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// Dimming is off.
    Disabled,
    /// Dimming follows the caret.
    Idle,
    /// Dimming is suspended while the user scrolls.
    Scrolling,
}

/// Monotonic refresh generation. Results carrying an older generation are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Mutable state of a focus controller.
#[derive(Debug, Clone)]
pub struct FocusState {
    mode: FocusMode,
    window_focused: bool,
    generation: Generation,
    tracker: ScrollVelocityTracker,
    scroll_deadline: Option<Instant>,
}

impl FocusState {
    /// Create state; `enabled` selects between `Idle` and `Disabled`.
    pub fn new(enabled: bool, config: &FocusConfig) -> Self {
        Self {
            mode: if enabled {
                FocusMode::Idle
            } else {
                FocusMode::Disabled
            },
            window_focused: true,
            generation: Generation::default(),
            tracker: ScrollVelocityTracker::new(config.scroll_velocity_threshold),
            scroll_deadline: None,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> FocusMode {
        self.mode
    }

    /// Returns true unless the mode is `Disabled`.
    pub fn is_enabled(&self) -> bool {
        self.mode != FocusMode::Disabled
    }

    /// The zen-mode proxy: whether the editor window has focus.
    pub fn zen_mode(&self) -> bool {
        self.window_focused
    }

    /// Latest issued generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Pending scroll debounce deadline.
    pub fn scroll_deadline(&self) -> Option<Instant> {
        self.scroll_deadline
    }

    /// Returns true if `generation` is still the latest.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// Issue a new generation, invalidating everything in flight.
    pub fn advance(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    /// Flip between `Disabled` and `Idle`. Returns the new enabled state.
    ///
    /// Turning off from any enabled mode cancels the debounce and forgets scroll history.
    pub fn toggle(&mut self) -> bool {
        self.advance();
        if self.is_enabled() {
            self.mode = FocusMode::Disabled;
            self.scroll_deadline = None;
            self.tracker.reset();
        } else {
            self.mode = FocusMode::Idle;
        }
        self.is_enabled()
    }

    /// The caret moved: cancel any pending debounce and return to `Idle`.
    ///
    /// No-op while disabled.
    pub fn settle(&mut self) {
        if !self.is_enabled() {
            return;
        }
        self.advance();
        self.scroll_deadline = None;
        self.mode = FocusMode::Idle;
    }

    /// A different view became active: settle and drop the previous view's scroll history.
    pub fn switch_view(&mut self) {
        self.settle();
        self.tracker.reset();
    }

    /// Feed a viewport sample to the tracker; returns true for a fast scroll.
    pub fn observe_scroll(&mut self, sample: ScrollSample) -> bool {
        self.tracker.observe(sample)
    }

    /// Enter `Scrolling`, invalidating in-flight refreshes.
    pub fn begin_scrolling(&mut self) {
        if self.is_enabled() {
            self.advance();
            self.mode = FocusMode::Scrolling;
        }
    }

    /// (Re)start the debounce timer.
    pub fn arm_debounce(&mut self, deadline: Instant) {
        self.scroll_deadline = Some(deadline);
    }

    /// The debounce fired: leave `Scrolling`. Returns false if no debounce was pending.
    pub fn debounce_elapsed(&mut self) -> bool {
        if self.scroll_deadline.take().is_none() {
            return false;
        }
        if self.mode == FocusMode::Scrolling {
            self.mode = FocusMode::Idle;
        }
        true
    }

    /// Update the zen-mode proxy. Returns true if it changed.
    ///
    /// Leaves the generation alone: the flag only matters behind the zen gate, where the
    /// controller follows up with a refresh or a clear.
    pub fn set_window_focused(&mut self, focused: bool) -> bool {
        if self.window_focused == focused {
            return false;
        }
        self.window_focused = focused;
        true
    }

    /// Apply new settings that affect persistent state.
    pub fn reconfigure(&mut self, config: &FocusConfig) {
        self.tracker.set_threshold(config.scroll_velocity_threshold);
    }

    /// Why a refresh may not dim anything right now, or `None` if it may.
    pub fn ineligibility(&self, config: &FocusConfig) -> Option<ClearReason> {
        match self.mode {
            FocusMode::Disabled => Some(ClearReason::Disabled),
            FocusMode::Scrolling => Some(ClearReason::FastScroll),
            FocusMode::Idle if config.only_in_zen_mode && !self.window_focused => {
                Some(ClearReason::ZenGate)
            }
            FocusMode::Idle => None,
        }
    }
}
