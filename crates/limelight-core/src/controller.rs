//! Refresh orchestration.
//!
//! [`RefreshController`] turns host events into refresh cycles. It owns the [`FocusState`], the
//! dim style and the host collaborators, and it is the only writer of the decoration set.
//!
//! A refresh runs in three steps so that it can be suspended on the symbol provider while newer
//! events are handled:
//!
//! 1. the controller *prepares* it ([`Reaction::Resolve`]), capturing the view and a generation;
//! 2. [`PendingRefresh::resolve`] computes the focus region without borrowing the controller;
//! 3. [`RefreshController::complete`] applies the result, unless the generation, document or
//!    bounds show it is stale by now.
//!
//! # Example
//!
//! ```rust
//! use limelight_core::{
//!     ActiveView, DocumentId, DocumentSnapshot, FocusEvent, FocusHost, JsonSettings, LineRange,
//!     NoSymbols, Position, RefreshController, Selection, SharedDecorations, SharedView,
//! };
//! use std::rc::Rc;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let doc = DocumentSnapshot::from_text(DocumentId(1), 0, "a\nb\n\nc\nd\n\ne");
//! let view = SharedView::new(ActiveView::new(
//!     doc,
//!     Selection::caret(Position::new(3, 0)),
//!     vec![LineRange::new(0, 6)],
//! ));
//! let sink = SharedDecorations::new();
//! let host = FocusHost {
//!     views: Box::new(view.clone()),
//!     sink: Box::new(sink.clone()),
//!     symbols: Rc::new(NoSymbols),
//!     settings: Box::new(JsonSettings::default()),
//! };
//!
//! let mut controller = RefreshController::new(host).unwrap();
//! controller.activate().await;
//! assert_eq!(sink.dimmed_lines(), vec![0, 1, 2, 5, 6]);
//! # });
//! ```

use crate::config::{ConfigChange, ConfigSource, FocusConfig, NAMESPACE};
use crate::decorations::{DecorationSink, DimStyle, StyleHandle, plan};
use crate::document::{DocumentId, TextDocument};
use crate::error::FocusError;
use crate::outcome::{ClearReason, RefreshOutcome, StaleReason};
use crate::resolver::{FocusResolver, ResolvedFocus};
use crate::scroll::ScrollSample;
use crate::state::{FocusMode, FocusState, Generation};
use crate::symbols::SymbolProvider;
use crate::view::{ActiveView, ViewProvider, VisibleWindow};
use std::rc::Rc;
use std::time::Duration;
use tokio::time::Instant;

// Decision-level logs are opt-in via `enableLogging`.
macro_rules! decision {
    ($config:expr, $($arg:tt)+) => {
        if $config.enable_logging {
            tracing::debug!($($arg)+);
        }
    };
}

/// Host events the controller reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    /// The toggle command was invoked.
    Toggle,
    /// The selection (or caret) of the active view changed.
    SelectionChanged,
    /// The visible ranges of the active view changed.
    ViewportChanged,
    /// A different view became active.
    ActiveViewChanged,
    /// The editor window gained (`true`) or lost (`false`) focus.
    WindowFocusChanged(bool),
    /// Settings changed in some section.
    ConfigChanged(ConfigChange),
    /// The host is shutting down.
    Shutdown,
}

/// Collaborators the controller is wired to.
pub struct FocusHost {
    /// Active view access (document, selection, viewport).
    pub views: Box<dyn ViewProvider>,
    /// Where dim decorations are applied.
    pub sink: Box<dyn DecorationSink>,
    /// Document symbol source for symbol-based focus.
    pub symbols: Rc<dyn SymbolProvider>,
    /// Settings source.
    pub settings: Box<dyn ConfigSource>,
}

/// What the controller needs the caller to do next.
#[must_use]
pub enum Reaction {
    /// The event required no refresh.
    Nothing,
    /// The event was handled synchronously.
    Settled(RefreshOutcome),
    /// A refresh is underway; resolve it and hand the result to [`RefreshController::complete`].
    Resolve(PendingRefresh),
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reaction::Nothing => f.write_str("Nothing"),
            Reaction::Settled(outcome) => f.debug_tuple("Settled").field(outcome).finish(),
            Reaction::Resolve(pending) => f
                .debug_struct("Resolve")
                .field("generation", &pending.generation)
                .finish(),
        }
    }
}

/// A prepared refresh whose focus region has not been resolved yet.
pub struct PendingRefresh {
    generation: Generation,
    view: ActiveView,
    window: VisibleWindow,
    config: FocusConfig,
    symbols: Rc<dyn SymbolProvider>,
}

impl PendingRefresh {
    /// Generation this refresh was issued with.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Resolve the focus region. May suspend on the symbol provider.
    pub async fn resolve(self) -> ResolvedRefresh {
        let document = &self.view.document;
        let resolver = FocusResolver::new(&self.config, self.symbols.as_ref());
        let focus = resolver
            .resolve(document, document.id(), self.view.selection)
            .await;
        ResolvedRefresh {
            generation: self.generation,
            document: document.id(),
            version: document.version(),
            window: self.window,
            focus,
        }
    }
}

/// A refresh whose focus region has been resolved, ready to be applied.
#[derive(Debug)]
pub struct ResolvedRefresh {
    generation: Generation,
    document: DocumentId,
    version: u64,
    window: VisibleWindow,
    focus: Result<ResolvedFocus, FocusError>,
}

impl ResolvedRefresh {
    /// Generation this refresh was issued with.
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// The focus-highlighting state machine.
pub struct RefreshController {
    host: FocusHost,
    config: FocusConfig,
    state: FocusState,
    style: Option<StyleHandle>,
    clock_origin: Instant,
}

impl RefreshController {
    /// Load settings and create the dim style.
    ///
    /// Highlighting starts enabled. Fails only if the sink rejects the style, which the host
    /// should surface to the user.
    pub fn new(mut host: FocusHost) -> Result<Self, FocusError> {
        let config = FocusConfig::load(host.settings.as_ref());
        let style = host
            .sink
            .create_style(dim_style(&config))
            .map_err(into_setup)
            .inspect_err(|err| tracing::error!(error = %err, "failed to create dim style"))?;
        let state = FocusState::new(true, &config);
        decision!(config, "focus highlighting active");
        Ok(Self {
            host,
            config,
            state,
            style: Some(style),
            clock_origin: Instant::now(),
        })
    }

    /// Current settings.
    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    /// Current mode.
    pub fn mode(&self) -> FocusMode {
        self.state.mode()
    }

    /// Returns true unless highlighting is toggled off.
    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    /// Persistent state (read-only).
    pub fn state(&self) -> &FocusState {
        &self.state
    }

    /// When the scroll debounce will fire, if it is running.
    pub fn deadline(&self) -> Option<Instant> {
        self.state.scroll_deadline()
    }

    /// Handle of the live dim style.
    pub fn style(&self) -> Option<StyleHandle> {
        self.style
    }

    /// Prepare the initial refresh after wiring.
    pub fn start(&mut self) -> Reaction {
        self.refresh()
    }

    /// Run the initial refresh after wiring.
    pub async fn activate(&mut self) -> Option<RefreshOutcome> {
        let reaction = self.start();
        self.drive(reaction).await
    }

    /// Dispose the dim style. The controller does nothing useful afterwards.
    pub fn deactivate(&mut self) {
        self.state.advance();
        if let Some(style) = self.style.take() {
            self.host.sink.dispose_style(style);
        }
        decision!(self.config, "focus highlighting deactivated");
    }

    /// React to a host event received at `now`.
    ///
    /// Only a failed style rebuild after a settings change returns `Err`.
    pub fn handle(&mut self, event: FocusEvent, now: Instant) -> Result<Reaction, FocusError> {
        let reaction = match event {
            FocusEvent::Toggle => self.on_toggle(),
            FocusEvent::SelectionChanged => self.on_selection_changed(),
            FocusEvent::ViewportChanged => self.on_viewport_changed(now),
            FocusEvent::ActiveViewChanged => self.on_active_view_changed(),
            FocusEvent::WindowFocusChanged(focused) => self.on_window_focus_changed(focused),
            FocusEvent::ConfigChanged(change) => return self.on_config_changed(&change),
            FocusEvent::Shutdown => {
                self.deactivate();
                Reaction::Nothing
            }
        };
        Ok(reaction)
    }

    /// The scroll debounce deadline passed.
    pub fn debounce_elapsed(&mut self) -> Reaction {
        if !self.state.debounce_elapsed() {
            return Reaction::Nothing;
        }
        if !self.is_enabled() {
            return Reaction::Nothing;
        }

        let cursor_visible = self
            .host
            .views
            .active_view()
            .is_some_and(|view| view.cursor_visible());
        if cursor_visible {
            decision!(self.config, "scroll settled, restoring focus");
            self.refresh()
        } else {
            decision!(
                self.config,
                "scroll settled with cursor out of view, keeping decorations cleared"
            );
            Reaction::Settled(RefreshOutcome::Deferred)
        }
    }

    /// Apply a resolved refresh, unless it has gone stale.
    pub fn complete(&mut self, resolved: ResolvedRefresh) -> RefreshOutcome {
        if !self.state.is_current(resolved.generation) {
            decision!(
                self.config,
                generation = resolved.generation.get(),
                latest = self.state.generation().get(),
                "discarding superseded refresh"
            );
            return RefreshOutcome::Discarded(StaleReason::Superseded);
        }

        let focus = match resolved.focus {
            Ok(focus) => focus,
            Err(err) => {
                decision!(self.config, error = %err, "discarding refresh with out-of-range focus");
                return RefreshOutcome::Discarded(StaleReason::RegionOutOfBounds);
            }
        };

        let Some(current) = self.host.views.active_view() else {
            return RefreshOutcome::Discarded(StaleReason::DocumentChanged);
        };
        let doc = &current.document;
        if doc.id() != resolved.document || doc.version() != resolved.version {
            decision!(self.config, "document changed during refresh, discarding");
            return RefreshOutcome::Discarded(StaleReason::DocumentChanged);
        }
        if !focus.region.fits(doc.line_count()) {
            return RefreshOutcome::Discarded(StaleReason::RegionOutOfBounds);
        }

        let Some(style) = self.style else {
            return RefreshOutcome::Discarded(StaleReason::Superseded);
        };

        let ranges = plan(&resolved.window, &focus.region, doc);
        self.host.sink.set_decorations(style, &ranges);
        decision!(
            self.config,
            focus_start = focus.region.start_line,
            focus_end = focus.region.end_line,
            strategy = ?focus.strategy,
            dimmed = ranges.len(),
            "decorations applied"
        );

        RefreshOutcome::Applied {
            focus: focus.region,
            strategy: focus.strategy,
            dimmed: ranges.len(),
        }
    }

    /// Carry a reaction through to its outcome, resolving inline if needed.
    pub async fn drive(&mut self, reaction: Reaction) -> Option<RefreshOutcome> {
        match reaction {
            Reaction::Nothing => None,
            Reaction::Settled(outcome) => Some(outcome),
            Reaction::Resolve(pending) => {
                let resolved = pending.resolve().await;
                Some(self.complete(resolved))
            }
        }
    }

    /// Handle an event and drive its refresh to completion.
    pub async fn process(
        &mut self,
        event: FocusEvent,
        now: Instant,
    ) -> Result<Option<RefreshOutcome>, FocusError> {
        let reaction = self.handle(event, now)?;
        Ok(self.drive(reaction).await)
    }

    fn on_toggle(&mut self) -> Reaction {
        let enabled = self.state.toggle();
        tracing::info!(
            "focus highlighting {}",
            if enabled { "enabled" } else { "disabled" }
        );
        if enabled {
            self.refresh()
        } else {
            Reaction::Settled(self.clear(ClearReason::Disabled))
        }
    }

    fn on_selection_changed(&mut self) -> Reaction {
        if !self.is_enabled() {
            return Reaction::Nothing;
        }
        self.state.settle();
        self.refresh()
    }

    fn on_active_view_changed(&mut self) -> Reaction {
        if !self.is_enabled() {
            return Reaction::Nothing;
        }
        self.state.switch_view();
        self.refresh()
    }

    fn on_viewport_changed(&mut self, now: Instant) -> Reaction {
        if !self.is_enabled() {
            return Reaction::Nothing;
        }
        if !self.config.disable_while_scrolling {
            return self.refresh();
        }
        let Some(view) = self.host.views.active_view() else {
            return Reaction::Nothing;
        };

        let fast = match view.top_line() {
            Some(top_line) => {
                let sample = ScrollSample::new(self.millis_since_origin(now), top_line);
                self.state.observe_scroll(sample)
            }
            None => false,
        };
        let cursor_hidden = !view.cursor_visible();

        let deadline = now + Duration::from_millis(self.config.scroll_debounce_delay_ms);
        self.state.arm_debounce(deadline);

        if !(fast || cursor_hidden) {
            return Reaction::Settled(RefreshOutcome::Deferred);
        }
        if self.mode() == FocusMode::Scrolling {
            return Reaction::Settled(RefreshOutcome::Deferred);
        }

        self.state.begin_scrolling();
        decision!(
            self.config,
            fast,
            cursor_hidden,
            "cleared due to fast scroll"
        );
        Reaction::Settled(self.clear(ClearReason::FastScroll))
    }

    fn on_window_focus_changed(&mut self, focused: bool) -> Reaction {
        if !self.state.set_window_focused(focused) {
            return Reaction::Nothing;
        }
        decision!(self.config, zen_mode = focused, "window focus changed");
        if self.config.only_in_zen_mode && self.mode() == FocusMode::Idle {
            self.refresh()
        } else {
            Reaction::Nothing
        }
    }

    fn on_config_changed(&mut self, change: &ConfigChange) -> Result<Reaction, FocusError> {
        if !change.affects(NAMESPACE) {
            return Ok(Reaction::Nothing);
        }
        self.config = FocusConfig::load(self.host.settings.as_ref());
        self.state.reconfigure(&self.config);
        decision!(self.config, config = ?self.config, "configuration changed");

        self.rebuild_style()?;
        if self.mode() == FocusMode::Idle {
            Ok(self.refresh())
        } else {
            Ok(Reaction::Nothing)
        }
    }

    fn rebuild_style(&mut self) -> Result<(), FocusError> {
        // Results in flight were computed for the old style.
        self.state.advance();
        if let Some(old) = self.style.take() {
            self.host.sink.dispose_style(old);
        }
        let style = self
            .host
            .sink
            .create_style(dim_style(&self.config))
            .map_err(into_setup)
            .inspect_err(|err| tracing::error!(error = %err, "failed to rebuild dim style"))?;
        self.style = Some(style);
        Ok(())
    }

    fn refresh(&mut self) -> Reaction {
        if let Some(reason) = self.state.ineligibility(&self.config) {
            return Reaction::Settled(self.clear(reason));
        }

        let Some(view) = self.host.views.active_view() else {
            decision!(self.config, "no active view, cannot update decorations");
            return Reaction::Settled(self.clear(ClearReason::NoView));
        };
        let line_count = view.document.line_count();
        if line_count == 0 {
            return Reaction::Settled(self.clear(ClearReason::EmptyDocument));
        }

        let window = view.visible_window(self.config.buffer_lines);
        if !window.fits(line_count) {
            return Reaction::Settled(RefreshOutcome::Discarded(StaleReason::WindowOutOfBounds));
        }
        decision!(
            self.config,
            document = ?view.document.id(),
            window = ?window.range(),
            "updating decorations"
        );

        let generation = self.state.advance();
        Reaction::Resolve(PendingRefresh {
            generation,
            view,
            window,
            config: self.config.clone(),
            symbols: Rc::clone(&self.host.symbols),
        })
    }

    fn clear(&mut self, reason: ClearReason) -> RefreshOutcome {
        // A clear supersedes any refresh still resolving.
        self.state.advance();
        if let Some(style) = self.style {
            self.host.sink.set_decorations(style, &[]);
        }
        decision!(self.config, ?reason, "decorations cleared");
        RefreshOutcome::Cleared(reason)
    }

    fn millis_since_origin(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.clock_origin);
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

fn into_setup(err: FocusError) -> FocusError {
    match err {
        FocusError::Setup(_) => err,
        other => FocusError::Setup(other.to_string()),
    }
}

fn dim_style(config: &FocusConfig) -> DimStyle {
    DimStyle {
        opacity: config.dim_opacity,
    }
}
