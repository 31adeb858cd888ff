use async_trait::async_trait;
use limelight_core::{
    ActiveView, BlockDetection, ClearReason, ConfigChange, DocumentId, DocumentSnapshot,
    DocumentSymbol, FocusError, FocusEvent, FocusHost, FocusMode, FocusStrategy, JsonSettings,
    LineRange, NoSymbols, Position, Reaction, RefreshController, RefreshOutcome, Selection,
    SharedDecorations, SharedView, SinkCall, StaleReason, StaticSymbols, SymbolKind,
    SymbolProvider, SymbolRange,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::Instant;

struct Harness {
    view: SharedView,
    sink: SharedDecorations,
    settings: Rc<RefCell<JsonSettings>>,
    controller: RefreshController,
    origin: Instant,
}

impl Harness {
    fn new(view: ActiveView) -> Self {
        Self::with(view, JsonSettings::default(), Rc::new(NoSymbols))
    }

    fn with(view: ActiveView, settings: JsonSettings, symbols: Rc<dyn SymbolProvider>) -> Self {
        let view = SharedView::new(view);
        let sink = SharedDecorations::new();
        let settings = Rc::new(RefCell::new(settings));
        let origin = Instant::now();
        let controller = RefreshController::new(FocusHost {
            views: Box::new(view.clone()),
            sink: Box::new(sink.clone()),
            symbols,
            settings: Box::new(Rc::clone(&settings)),
        })
        .unwrap();
        Self {
            view,
            sink,
            settings,
            controller,
            origin,
        }
    }

    fn at(&self, ms: u64) -> Instant {
        self.origin + Duration::from_millis(ms)
    }

    async fn send(&mut self, event: FocusEvent) -> Option<RefreshOutcome> {
        let now = Instant::now();
        self.controller.process(event, now).await.unwrap()
    }

    async fn scroll_to(&mut self, top: usize, ms: u64) -> Option<RefreshOutcome> {
        self.view.update(|view| {
            view.visible_ranges = vec![LineRange::new(top, top + 99)];
        });
        let now = self.at(ms);
        self.controller
            .process(FocusEvent::ViewportChanged, now)
            .await
            .unwrap()
    }

    fn move_caret(&self, line: usize) {
        self.view.update(|view| {
            view.selection = Selection::caret(Position::new(line, 0));
        });
    }
}

fn small_view(caret_line: usize) -> ActiveView {
    ActiveView::new(
        DocumentSnapshot::from_text(DocumentId(1), 0, "A\nB\n\nC\nD\n\nE"),
        Selection::caret(Position::new(caret_line, 0)),
        vec![LineRange::new(0, 6)],
    )
}

/// 1000 lines in paragraphs of four, separated by blank lines.
fn long_view(caret_line: usize, top: usize) -> ActiveView {
    let text = (0..1000)
        .map(|i| {
            if i % 5 == 4 {
                String::new()
            } else {
                format!("line {i}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    ActiveView::new(
        DocumentSnapshot::from_text(DocumentId(2), 0, &text),
        Selection::caret(Position::new(caret_line, 0)),
        vec![LineRange::new(top, top + 99)],
    )
}

fn applied(focus: LineRange, strategy: FocusStrategy, dimmed: usize) -> Option<RefreshOutcome> {
    Some(RefreshOutcome::Applied {
        focus,
        strategy,
        dimmed,
    })
}

#[tokio::test(start_paused = true)]
async fn test_activation_dims_around_the_caret_paragraph() {
    let mut h = Harness::new(small_view(3));
    let outcome = h.controller.activate().await;

    assert_eq!(
        outcome,
        applied(LineRange::new(3, 4), FocusStrategy::Paragraph, 5)
    );
    assert_eq!(h.sink.dimmed_lines(), vec![0, 1, 2, 5, 6]);
    assert_eq!(h.controller.mode(), FocusMode::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_is_idempotent() {
    let mut h = Harness::new(small_view(0));
    h.controller.activate().await;
    let first = h.sink.applied();

    h.send(FocusEvent::SelectionChanged).await;
    h.send(FocusEvent::SelectionChanged).await;

    assert_eq!(h.sink.applied(), first);
    assert_eq!(h.sink.dimmed_lines(), vec![2, 3, 4, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_caret_moves_follow_the_paragraph() {
    let mut h = Harness::new(small_view(0));
    h.controller.activate().await;

    h.move_caret(6);
    let outcome = h.send(FocusEvent::SelectionChanged).await;
    assert_eq!(
        outcome,
        applied(LineRange::single(6), FocusStrategy::Paragraph, 6)
    );
    assert!(!h.sink.is_dimmed(6));
    assert!(h.sink.is_dimmed(0));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_off_clears_and_ignores_further_events() {
    let mut h = Harness::new(small_view(3));
    h.controller.activate().await;
    h.sink.clear_history();

    let outcome = h.send(FocusEvent::Toggle).await;
    assert_eq!(outcome, Some(RefreshOutcome::Cleared(ClearReason::Disabled)));
    assert!(h.sink.applied().is_empty());
    assert!(!h.controller.is_enabled());

    assert_eq!(h.send(FocusEvent::SelectionChanged).await, None);
    assert_eq!(h.send(FocusEvent::ViewportChanged).await, None);
    assert_eq!(h.send(FocusEvent::ActiveViewChanged).await, None);
    assert_eq!(h.sink.set_count(), 1);

    let outcome = h.send(FocusEvent::Toggle).await;
    assert!(outcome.is_some_and(|o| o.is_applied()));
    assert_eq!(h.sink.dimmed_lines(), vec![0, 1, 2, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_fast_scroll_clears_once_and_debounce_restores() {
    let mut h = Harness::new(long_view(300, 250));
    h.controller.activate().await;
    assert!(!h.sink.applied().is_empty());
    h.sink.clear_history();

    // 15 lines every 20ms is 0.75 lines/ms, above the 0.5 default threshold.
    assert_eq!(h.scroll_to(250, 20).await, Some(RefreshOutcome::Deferred));
    assert_eq!(h.scroll_to(265, 40).await, Some(RefreshOutcome::Deferred));
    assert_eq!(
        h.scroll_to(280, 60).await,
        Some(RefreshOutcome::Cleared(ClearReason::FastScroll))
    );
    assert_eq!(h.controller.mode(), FocusMode::Scrolling);
    assert!(h.sink.applied().is_empty());

    assert_eq!(h.scroll_to(295, 80).await, Some(RefreshOutcome::Deferred));
    assert_eq!(h.sink.set_count(), 1);
    assert_eq!(h.controller.deadline(), Some(h.at(80 + 150)));

    let reaction = h.controller.debounce_elapsed();
    let outcome = h.controller.drive(reaction).await;
    assert_eq!(
        outcome,
        applied(LineRange::new(300, 303), FocusStrategy::Paragraph, 196)
    );
    assert_eq!(h.controller.mode(), FocusMode::Idle);
    assert_eq!(h.controller.deadline(), None);
}

#[tokio::test(start_paused = true)]
async fn test_slow_scroll_keeps_the_decorations() {
    let mut h = Harness::new(long_view(300, 250));
    h.controller.activate().await;
    h.sink.clear_history();

    for (i, top) in [250, 252, 254, 256].into_iter().enumerate() {
        let ms = 100 * (i as u64 + 1);
        assert_eq!(h.scroll_to(top, ms).await, Some(RefreshOutcome::Deferred));
    }
    assert_eq!(h.controller.mode(), FocusMode::Idle);
    assert_eq!(h.sink.set_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_scrolling_the_caret_out_of_view_clears_until_it_returns() {
    let mut h = Harness::new(long_view(300, 250));
    h.controller.activate().await;
    h.sink.clear_history();

    assert_eq!(
        h.scroll_to(600, 500).await,
        Some(RefreshOutcome::Cleared(ClearReason::FastScroll))
    );

    let reaction = h.controller.debounce_elapsed();
    assert_eq!(
        h.controller.drive(reaction).await,
        Some(RefreshOutcome::Deferred)
    );
    assert_eq!(h.sink.set_count(), 1);
    assert_eq!(h.controller.mode(), FocusMode::Idle);

    h.move_caret(620);
    let outcome = h.send(FocusEvent::SelectionChanged).await;
    assert_eq!(
        outcome,
        applied(LineRange::new(620, 623), FocusStrategy::Paragraph, 196)
    );
}

#[tokio::test(start_paused = true)]
async fn test_toggle_while_scrolling_clears_exactly_once() {
    let mut h = Harness::new(long_view(300, 250));
    h.controller.activate().await;
    h.scroll_to(600, 500).await;
    assert_eq!(h.controller.mode(), FocusMode::Scrolling);
    h.sink.clear_history();

    let outcome = h.send(FocusEvent::Toggle).await;
    assert_eq!(outcome, Some(RefreshOutcome::Cleared(ClearReason::Disabled)));
    assert_eq!(h.controller.deadline(), None);

    h.scroll_to(620, 520).await;
    h.scroll_to(640, 540).await;
    let reaction = h.controller.debounce_elapsed();
    assert_eq!(h.controller.drive(reaction).await, None);

    let style = h.controller.style().unwrap();
    assert_eq!(h.sink.calls(), vec![SinkCall::Set(style, Vec::new())]);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_detection_can_be_disabled() {
    let settings = JsonSettings::new(json!({ "limelight.disableWhileScrolling": false }));
    let mut h = Harness::with(long_view(300, 250), settings, Rc::new(NoSymbols));
    h.controller.activate().await;

    // The caret paragraph is now outside the window, so every line in it is dimmed.
    let outcome = h.scroll_to(600, 500).await;
    assert_eq!(
        outcome,
        applied(LineRange::new(300, 303), FocusStrategy::Paragraph, 200)
    );
    assert_eq!(h.controller.mode(), FocusMode::Idle);
    assert_eq!(h.controller.deadline(), None);
}

#[tokio::test(start_paused = true)]
async fn test_zen_gate_follows_window_focus() {
    let settings = JsonSettings::new(json!({ "limelight": { "onlyInZenMode": true } }));
    let mut h = Harness::with(small_view(3), settings, Rc::new(NoSymbols));
    assert!(h.controller.activate().await.is_some_and(|o| o.is_applied()));

    let outcome = h.send(FocusEvent::WindowFocusChanged(false)).await;
    assert_eq!(outcome, Some(RefreshOutcome::Cleared(ClearReason::ZenGate)));
    assert!(h.sink.applied().is_empty());

    assert_eq!(
        h.send(FocusEvent::SelectionChanged).await,
        Some(RefreshOutcome::Cleared(ClearReason::ZenGate))
    );
    assert_eq!(h.send(FocusEvent::WindowFocusChanged(false)).await, None);

    let outcome = h.send(FocusEvent::WindowFocusChanged(true)).await;
    assert!(outcome.is_some_and(|o| o.is_applied()));
    assert_eq!(h.sink.dimmed_lines(), vec![0, 1, 2, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_window_focus_is_ignored_without_zen_gate() {
    let mut h = Harness::new(small_view(3));
    h.controller.activate().await;
    h.sink.clear_history();

    assert_eq!(h.send(FocusEvent::WindowFocusChanged(false)).await, None);
    assert_eq!(h.sink.set_count(), 0);
    assert_eq!(h.sink.dimmed_lines(), vec![0, 1, 2, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_config_change_rebuilds_the_style() {
    let mut h = Harness::new(small_view(3));
    h.controller.activate().await;
    let old_style = h.controller.style().unwrap();
    h.sink.clear_history();

    h.settings
        .borrow_mut()
        .set("limelight.dimOpacity", json!(0.6));
    h.settings
        .borrow_mut()
        .set("limelight.paragraphMode", json!(false));
    let outcome = h
        .send(FocusEvent::ConfigChanged(ConfigChange::new("limelight")))
        .await;

    assert_eq!(
        outcome,
        applied(LineRange::single(3), FocusStrategy::Selection, 6)
    );
    let new_style = h.controller.style().unwrap();
    assert_ne!(new_style, old_style);
    assert_eq!(h.controller.config().dim_opacity, 0.6);

    let calls = h.sink.calls();
    assert_eq!(calls[0], SinkCall::Dispose(old_style));
    assert!(matches!(calls[1], SinkCall::Create(handle, style) if handle == new_style && style.opacity == 0.6));
    assert!(matches!(&calls[2], SinkCall::Set(handle, ranges) if *handle == new_style && ranges.len() == 6));
}

#[tokio::test(start_paused = true)]
async fn test_config_change_while_scrolling_only_rebuilds_the_style() {
    let mut h = Harness::new(long_view(300, 250));
    h.controller.activate().await;
    h.scroll_to(600, 500).await;
    assert_eq!(h.controller.mode(), FocusMode::Scrolling);
    let old_style = h.controller.style().unwrap();
    h.sink.clear_history();

    h.settings
        .borrow_mut()
        .set("limelight.dimOpacity", json!(0.5));
    let outcome = h
        .send(FocusEvent::ConfigChanged(ConfigChange::new("limelight")))
        .await;

    assert_eq!(outcome, None);
    assert_eq!(h.controller.mode(), FocusMode::Scrolling);
    assert!(h.controller.deadline().is_some());
    let new_style = h.controller.style().unwrap();
    let calls = h.sink.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], SinkCall::Dispose(old_style));
    assert!(matches!(calls[1], SinkCall::Create(handle, style) if handle == new_style && style.opacity == 0.5));
    assert_eq!(h.sink.set_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_config_change_while_disabled_only_rebuilds_the_style() {
    let mut h = Harness::new(small_view(3));
    h.controller.activate().await;
    h.send(FocusEvent::Toggle).await;
    let old_style = h.controller.style().unwrap();
    h.sink.clear_history();

    h.settings
        .borrow_mut()
        .set("limelight.dimOpacity", json!(0.5));
    let outcome = h
        .send(FocusEvent::ConfigChanged(ConfigChange::new("limelight")))
        .await;

    assert_eq!(outcome, None);
    assert!(!h.controller.is_enabled());
    let calls = h.sink.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], SinkCall::Dispose(old_style));
    assert!(matches!(calls[1], SinkCall::Create(_, style) if style.opacity == 0.5));
    assert!(h.sink.applied().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_config_changes_are_ignored() {
    let mut h = Harness::new(small_view(3));
    h.controller.activate().await;
    h.sink.clear_history();

    let outcome = h
        .send(FocusEvent::ConfigChanged(ConfigChange::new("editor.fontSize")))
        .await;
    assert_eq!(outcome, None);
    assert!(h.sink.calls().is_empty());

    let outcome = h
        .send(FocusEvent::ConfigChanged(ConfigChange::new(
            "limelightExtra.enabled",
        )))
        .await;
    assert_eq!(outcome, None);
}

#[tokio::test(start_paused = true)]
async fn test_style_creation_failure_is_a_setup_error() {
    let sink = SharedDecorations::new();
    sink.fail_style_creation(true);
    let result = RefreshController::new(FocusHost {
        views: Box::new(SharedView::new(small_view(0))),
        sink: Box::new(sink.clone()),
        symbols: Rc::new(NoSymbols),
        settings: Box::new(JsonSettings::default()),
    });
    assert!(matches!(result, Err(FocusError::Setup(_))));

    let mut h = Harness::new(small_view(0));
    h.sink.fail_style_creation(true);
    let result = h.controller.handle(
        FocusEvent::ConfigChanged(ConfigChange::new("limelight")),
        Instant::now(),
    );
    assert!(matches!(result, Err(FocusError::Setup(_))));
}

#[tokio::test(start_paused = true)]
async fn test_missing_view_clears() {
    let mut h = Harness::new(small_view(3));
    h.controller.activate().await;

    h.view.clear();
    assert_eq!(
        h.send(FocusEvent::ActiveViewChanged).await,
        Some(RefreshOutcome::Cleared(ClearReason::NoView))
    );
    assert!(h.sink.applied().is_empty());

    h.view.set(long_view(10, 0));
    let outcome = h.send(FocusEvent::ActiveViewChanged).await;
    assert_eq!(
        outcome,
        applied(LineRange::new(10, 13), FocusStrategy::Paragraph, 146)
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_disposes_the_style() {
    let mut h = Harness::new(small_view(3));
    h.controller.activate().await;
    let style = h.controller.style().unwrap();

    assert_eq!(h.send(FocusEvent::Shutdown).await, None);
    assert_eq!(h.controller.style(), None);
    assert_eq!(h.sink.active_style(), None);
    assert_eq!(h.sink.calls().last(), Some(&SinkCall::Dispose(style)));
}

struct SlowSymbols {
    delay: Duration,
    inner: StaticSymbols,
}

#[async_trait(?Send)]
impl SymbolProvider for SlowSymbols {
    async fn document_symbols(
        &self,
        document: DocumentId,
    ) -> Result<Vec<DocumentSymbol>, FocusError> {
        tokio::time::sleep(self.delay).await;
        self.inner.document_symbols(document).await
    }
}

fn slow_symbol_harness() -> Harness {
    let function = |name: &str, start: usize, end: usize| {
        DocumentSymbol::new(
            name,
            SymbolKind::Function,
            SymbolRange::new(Position::new(start, 0), Position::new(end, 0)),
        )
    };
    let symbols = SlowSymbols {
        delay: Duration::from_millis(300),
        inner: StaticSymbols::new(vec![function("first", 0, 1), function("second", 3, 4)]),
    };
    let settings = JsonSettings::new(json!({ "limelight.blockDetection": "documentSymbols" }));
    Harness::with(small_view(0), settings, Rc::new(symbols))
}

fn expect_resolve(reaction: Reaction) -> limelight_core::PendingRefresh {
    match reaction {
        Reaction::Resolve(pending) => pending,
        other => panic!("expected a pending refresh, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_superseded_symbol_lookup_is_discarded() {
    let mut h = slow_symbol_harness();
    assert_eq!(h.controller.config().block_detection, BlockDetection::DocumentSymbols);

    let first = expect_resolve(
        h.controller
            .handle(FocusEvent::SelectionChanged, Instant::now())
            .unwrap(),
    );
    h.move_caret(3);
    let second = expect_resolve(
        h.controller
            .handle(FocusEvent::SelectionChanged, Instant::now())
            .unwrap(),
    );

    let (first, second) = tokio::join!(first.resolve(), second.resolve());

    let outcome = h.controller.complete(second);
    assert_eq!(
        outcome,
        RefreshOutcome::Applied {
            focus: LineRange::new(3, 4),
            strategy: FocusStrategy::Symbol {
                name: "second".to_string(),
                kind: SymbolKind::Function,
            },
            dimmed: 5,
        }
    );
    assert_eq!(
        h.controller.complete(first),
        RefreshOutcome::Discarded(StaleReason::Superseded)
    );
    assert_eq!(h.sink.set_count(), 1);
    assert_eq!(h.sink.dimmed_lines(), vec![0, 1, 2, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_edit_during_lookup_is_discarded() {
    let mut h = slow_symbol_harness();
    let pending = expect_resolve(
        h.controller
            .handle(FocusEvent::SelectionChanged, Instant::now())
            .unwrap(),
    );

    h.view.update(|view| {
        view.document = DocumentSnapshot::from_text(DocumentId(1), 1, "A\nB");
    });
    let resolved = pending.resolve().await;

    assert_eq!(
        h.controller.complete(resolved),
        RefreshOutcome::Discarded(StaleReason::DocumentChanged)
    );
    assert_eq!(h.sink.set_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_during_lookup_wins() {
    let mut h = slow_symbol_harness();
    let pending = expect_resolve(
        h.controller
            .handle(FocusEvent::SelectionChanged, Instant::now())
            .unwrap(),
    );
    let outcome = h.send(FocusEvent::Toggle).await;
    assert_eq!(outcome, Some(RefreshOutcome::Cleared(ClearReason::Disabled)));

    let resolved = pending.resolve().await;
    assert_eq!(
        h.controller.complete(resolved),
        RefreshOutcome::Discarded(StaleReason::Superseded)
    );
    assert!(h.sink.applied().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_window_focus_change_keeps_lookup_without_zen_gate() {
    let mut h = slow_symbol_harness();
    h.move_caret(3);
    let pending = expect_resolve(
        h.controller
            .handle(FocusEvent::SelectionChanged, Instant::now())
            .unwrap(),
    );

    let reaction = h
        .controller
        .handle(FocusEvent::WindowFocusChanged(false), Instant::now())
        .unwrap();
    assert!(matches!(reaction, Reaction::Nothing));

    let resolved = pending.resolve().await;
    assert_eq!(
        h.controller.complete(resolved),
        RefreshOutcome::Applied {
            focus: LineRange::new(3, 4),
            strategy: FocusStrategy::Symbol {
                name: "second".to_string(),
                kind: SymbolKind::Function,
            },
            dimmed: 5,
        }
    );
    assert_eq!(h.sink.dimmed_lines(), vec![0, 1, 2, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_zen_gate_closing_during_lookup_wins() {
    let mut h = slow_symbol_harness();
    h.settings
        .borrow_mut()
        .set("limelight.onlyInZenMode", json!(true));
    h.send(FocusEvent::ConfigChanged(ConfigChange::new("limelight")))
        .await;
    h.move_caret(3);
    let pending = expect_resolve(
        h.controller
            .handle(FocusEvent::SelectionChanged, Instant::now())
            .unwrap(),
    );

    let outcome = h.send(FocusEvent::WindowFocusChanged(false)).await;
    assert_eq!(outcome, Some(RefreshOutcome::Cleared(ClearReason::ZenGate)));

    let resolved = pending.resolve().await;
    assert_eq!(
        h.controller.complete(resolved),
        RefreshOutcome::Discarded(StaleReason::Superseded)
    );
    assert!(h.sink.applied().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_symbol_lookup_without_match_uses_the_selection() {
    let mut h = slow_symbol_harness();
    h.move_caret(2);
    let outcome = h.send(FocusEvent::SelectionChanged).await;
    assert_eq!(
        outcome,
        applied(LineRange::single(2), FocusStrategy::SymbolFallback, 6)
    );
}
