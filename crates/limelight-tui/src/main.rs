//! Focus highlighting demo
//!
//! A read-only terminal viewer built with crossterm and ratatui that dims every line outside the
//! block under the caret, driven by `limelight-core`.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p limelight-tui -- <file_path> [--settings settings.json] [--symbols outline.json]
//! ```
//!
//! `--settings` takes a JSON object with `limelight.*` keys (flat or nested). `--symbols` takes
//! a saved `textDocument/documentSymbol` result for the file; it is re-read on every lookup and
//! switches focus detection to document symbols unless the settings say otherwise.
//!
//! Logs go to `limelight-tui-<pid>.log` in the temp directory (`RUST_LOG` overrides the filter).
//! Set `limelight.enableLogging` to see the controller's decisions.
//!
//! # Shortcuts
//!
//! - Arrow keys / Home / End: move the caret
//! - Shift+arrows: extend the selection
//! - PageUp/PageDown, mouse wheel: scroll without moving the caret
//! - Ctrl+L: toggle focus highlighting
//! - Ctrl+Z: flip the simulated window focus (zen mode)
//! - Ctrl+R: reload the settings file
//! - q / Ctrl+C: quit

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use limelight_core::{
    ActiveView, BlockDetection, ConfigChange, ConfigSource, DocumentId, DocumentSnapshot,
    FocusError, FocusEvent, FocusHost, FocusStrategy, JsonSettings, LineRange, NAMESPACE,
    NoSymbols, Position, RefreshController, RefreshOutcome, Selection, SharedDecorations,
    SharedView, SymbolProvider, TextDocument, ViewProvider,
};
use limelight_lsp::{LspSymbolProvider, SymbolResponse};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position as CursorPosition, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use serde_json::json;
use std::{
    cell::RefCell,
    env, fs,
    io::{self, stdout},
    path::PathBuf,
    process,
    rc::Rc,
    sync::Mutex,
    time::Duration,
};
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

const TAB_WIDTH: usize = 4;
const WHEEL_STEP: usize = 3;
const IDLE_POLL: Duration = Duration::from_millis(250);
// Border (2) + status line + shortcut line.
const CHROME_ROWS: u16 = 4;

struct Args {
    file_path: PathBuf,
    settings_path: Option<PathBuf>,
    symbols_path: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = env::args().skip(1);
    let mut file_path = None;
    let mut settings_path = None;
    let mut symbols_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                let value = args.next().ok_or("--settings needs a path")?;
                settings_path = Some(PathBuf::from(value));
            }
            "--symbols" => {
                let value = args.next().ok_or("--symbols needs a path")?;
                symbols_path = Some(PathBuf::from(value));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            path if file_path.is_none() => file_path = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument {extra}")),
        }
    }

    Ok(Args {
        file_path: file_path.ok_or("missing <file_path>")?,
        settings_path,
        symbols_path,
    })
}

fn init_logging() -> io::Result<PathBuf> {
    let path = env::temp_dir().join(format!("limelight-tui-{}.log", process::id()));
    let file = fs::File::create(&path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("limelight_core=debug,limelight_lsp=debug,limelight_tui=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(io::Error::other)?;
    Ok(path)
}

/// Read the settings file; with an outline available, symbol detection becomes the default.
fn load_settings(path: Option<&PathBuf>, prefer_symbols: bool) -> io::Result<JsonSettings> {
    let mut settings = match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            JsonSettings::from_json_str(&text).map_err(io::Error::other)?
        }
        None => JsonSettings::default(),
    };
    let detection_key = format!("{NAMESPACE}.blockDetection");
    if prefer_symbols && settings.get(&detection_key).is_none() {
        settings.set(&detection_key, json!("documentSymbols"));
    }
    Ok(settings)
}

/// Symbols come from a saved LSP response, re-read on every lookup so edits to the file show up.
fn symbol_provider(path: Option<PathBuf>, view: SharedView) -> Rc<dyn SymbolProvider> {
    let Some(path) = path else {
        return Rc::new(NoSymbols);
    };
    Rc::new(LspSymbolProvider::new(move |document| {
        let path = path.clone();
        let view = view.clone();
        async move {
            let snapshot = view
                .active_view()
                .map(|active| active.document)
                .filter(|doc| doc.id() == document)
                .ok_or_else(|| FocusError::ProviderUnavailable("document is not open".into()))?;
            let text = fs::read_to_string(&path).map_err(|err| {
                FocusError::ProviderUnavailable(format!("{}: {err}", path.display()))
            })?;
            let result = serde_json::from_str(&text)
                .map_err(|err| FocusError::ProviderUnavailable(err.to_string()))?;
            Ok::<_, FocusError>(SymbolResponse { snapshot, result })
        }
    }))
}

struct App {
    file_path: PathBuf,
    settings_path: Option<PathBuf>,
    has_symbols: bool,
    document: DocumentSnapshot,
    view: SharedView,
    sink: SharedDecorations,
    settings: Rc<RefCell<JsonSettings>>,
    controller: RefreshController,
    runtime: tokio::runtime::Runtime,
    caret: Position,
    anchor: Option<Position>,
    scroll_top: usize,
    viewport_height: usize,
    window_focused: bool,
    last_outcome: Option<RefreshOutcome>,
    status_message: String,
    should_quit: bool,
}

impl App {
    fn new(args: Args, viewport_height: usize) -> io::Result<Self> {
        let text = fs::read_to_string(&args.file_path)?;
        let document = DocumentSnapshot::from_text(DocumentId(1), 0, &text);

        let has_symbols = args.symbols_path.is_some();
        let settings = load_settings(args.settings_path.as_ref(), has_symbols)?;
        let settings = Rc::new(RefCell::new(settings));

        let caret = Position::new(0, 0);
        let view = SharedView::new(ActiveView::new(
            document.clone(),
            Selection::caret(caret),
            visible_lines(0, viewport_height, document.line_count()),
        ));
        let sink = SharedDecorations::new();
        let symbols = symbol_provider(args.symbols_path, view.clone());

        let controller = RefreshController::new(FocusHost {
            views: Box::new(view.clone()),
            sink: Box::new(sink.clone()),
            symbols,
            settings: Box::new(Rc::clone(&settings)),
        })
        .map_err(io::Error::other)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let mut app = Self {
            file_path: args.file_path,
            settings_path: args.settings_path,
            has_symbols,
            document,
            view,
            sink,
            settings,
            controller,
            runtime,
            caret,
            anchor: None,
            scroll_top: 0,
            viewport_height,
            window_focused: true,
            last_outcome: None,
            status_message: String::new(),
            should_quit: false,
        };
        let outcome = app.runtime.block_on(app.controller.activate());
        app.record(outcome);
        Ok(app)
    }

    fn selection(&self) -> Selection {
        Selection::new(self.anchor.unwrap_or(self.caret), self.caret)
    }

    fn publish_view(&self) {
        self.view.set(ActiveView::new(
            self.document.clone(),
            self.selection(),
            visible_lines(
                self.scroll_top,
                self.viewport_height,
                self.document.line_count(),
            ),
        ));
    }

    fn send(&mut self, event: FocusEvent) {
        self.publish_view();
        match self.controller.handle(event, Instant::now()) {
            Ok(reaction) => {
                let outcome = self.runtime.block_on(self.controller.drive(reaction));
                self.record(outcome);
            }
            Err(err) => {
                tracing::error!(error = %err, "focus highlighting failed");
                self.status_message = format!("limelight: {err}");
            }
        }
    }

    fn record(&mut self, outcome: Option<RefreshOutcome>) {
        if let Some(outcome) = outcome {
            self.last_outcome = Some(outcome);
        }
    }

    /// Fire the scroll debounce if its deadline has passed.
    fn tick(&mut self) {
        let Some(deadline) = self.controller.deadline() else {
            return;
        };
        if Instant::now() < deadline {
            return;
        }
        let reaction = self.controller.debounce_elapsed();
        let outcome = self.runtime.block_on(self.controller.drive(reaction));
        self.record(outcome);
    }

    fn poll_timeout(&self) -> Duration {
        self.controller
            .deadline()
            .map_or(IDLE_POLL, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            })
            .min(IDLE_POLL)
    }

    fn set_viewport_height(&mut self, height: usize) {
        if height == self.viewport_height {
            return;
        }
        self.viewport_height = height;
        self.clamp_scroll();
        self.send(FocusEvent::ViewportChanged);
    }

    fn max_scroll_top(&self) -> usize {
        self.document
            .line_count()
            .saturating_sub(self.viewport_height.max(1))
    }

    fn clamp_scroll(&mut self) {
        self.scroll_top = self.scroll_top.min(self.max_scroll_top());
    }

    fn scroll_by(&mut self, delta: isize) {
        let target = self
            .scroll_top
            .saturating_add_signed(delta)
            .min(self.max_scroll_top());
        if target != self.scroll_top {
            self.scroll_top = target;
            self.send(FocusEvent::ViewportChanged);
        }
    }

    fn move_caret_to(&mut self, line: usize, column: usize, selecting: bool) {
        let last_line = self.document.line_count().saturating_sub(1);
        let line = line.min(last_line);
        let column = column.min(self.document.line_len(line).unwrap_or(0));

        if selecting {
            if self.anchor.is_none() {
                self.anchor = Some(self.caret);
            }
        } else {
            self.anchor = None;
        }
        self.caret = Position::new(line, column);

        // Follow the caret like an editor would; this is a viewport change of its own.
        let height = self.viewport_height.max(1);
        let before = self.scroll_top;
        if line < self.scroll_top {
            self.scroll_top = line;
        } else if line >= self.scroll_top + height {
            self.scroll_top = line + 1 - height;
        }
        if self.scroll_top != before {
            self.send(FocusEvent::ViewportChanged);
        }
        self.send(FocusEvent::SelectionChanged);
    }

    fn move_caret_by(&mut self, lines: isize, columns: isize, selecting: bool) {
        let line = self.caret.line.saturating_add_signed(lines);
        let column = if lines == 0 {
            self.caret.column.saturating_add_signed(columns)
        } else {
            self.caret.column
        };
        self.move_caret_to(line, column, selecting);
    }

    fn toggle_window_focus(&mut self) {
        self.window_focused = !self.window_focused;
        self.send(FocusEvent::WindowFocusChanged(self.window_focused));
    }

    fn reload_settings(&mut self) {
        let Some(path) = self.settings_path.clone() else {
            self.status_message = "no settings file given (--settings)".to_string();
            return;
        };
        match load_settings(Some(&path), self.has_symbols) {
            Ok(settings) => {
                *self.settings.borrow_mut() = settings;
                self.status_message = format!("reloaded {}", path.display());
                self.send(FocusEvent::ConfigChanged(ConfigChange::new(NAMESPACE)));
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "settings reload failed");
                self.status_message = format!("settings: {err}");
            }
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.status_message.clear();

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let page = self.viewport_height.max(1) as isize;

        match key.code {
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('l') if ctrl => self.send(FocusEvent::Toggle),
            KeyCode::Char('z') if ctrl => self.toggle_window_focus(),
            KeyCode::Char('r') if ctrl => self.reload_settings(),
            KeyCode::Up => self.move_caret_by(-1, 0, shift),
            KeyCode::Down => self.move_caret_by(1, 0, shift),
            KeyCode::Left => self.move_caret_by(0, -1, shift),
            KeyCode::Right => self.move_caret_by(0, 1, shift),
            KeyCode::Home => self.move_caret_to(self.caret.line, 0, shift),
            KeyCode::End => self.move_caret_to(self.caret.line, usize::MAX, shift),
            KeyCode::PageUp => self.scroll_by(-page),
            KeyCode::PageDown => self.scroll_by(page),
            _ => {}
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_by(-(WHEEL_STEP as isize)),
            MouseEventKind::ScrollDown => self.scroll_by(WHEEL_STEP as isize),
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_document(frame, chunks[0]);
        self.render_status_line(frame, chunks[1]);
        self.render_shortcuts(frame, chunks[2]);
    }

    fn render_document(&self, frame: &mut Frame, area: Rect) {
        let selection = self.selection();
        let end = (self.scroll_top + self.viewport_height).min(self.document.line_count());

        let lines: Vec<Line> = (self.scroll_top..end)
            .map(|line| {
                let text = self.document.line_text(line).unwrap_or_default();
                let base = if self.sink.is_dimmed(line) {
                    Style::default().add_modifier(Modifier::DIM)
                } else {
                    Style::default()
                };
                styled_line(&text, line, &selection, base)
            })
            .collect();

        let title = format!(" {} ", self.file_path.display());
        let block = Block::default().borders(Borders::ALL).title(title);
        frame.render_widget(Paragraph::new(lines).block(block), area);

        if (self.scroll_top..end).contains(&self.caret.line) {
            let text = self.document.line_text(self.caret.line).unwrap_or_default();
            let x = display_column(&text, self.caret.column);
            let y = self.caret.line - self.scroll_top;
            let x = area.x + 1 + u16::try_from(x).unwrap_or(u16::MAX);
            let y = area.y + 1 + u16::try_from(y).unwrap_or(u16::MAX);
            if x < area.right().saturating_sub(1) {
                frame.set_cursor_position(CursorPosition::new(x, y));
            }
        }
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let status_text = if self.status_message.is_empty() {
            let config = self.controller.config();
            let detection = match config.block_detection {
                BlockDetection::Paragraph if config.paragraph_mode => "paragraph",
                BlockDetection::Paragraph => "selection",
                BlockDetection::DocumentSymbols => "symbols",
            };
            format!(
                "Ln {} Col {} | {} | {:?} | zen:{} | {} | {}",
                self.caret.line + 1,
                self.caret.column + 1,
                if self.controller.is_enabled() {
                    "focus on"
                } else {
                    "focus off"
                },
                self.controller.mode(),
                if self.window_focused { "yes" } else { "no" },
                detection,
                describe_outcome(self.last_outcome.as_ref()),
            )
        } else {
            self.status_message.clone()
        };

        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, area);
    }

    fn render_shortcuts(&self, frame: &mut Frame, area: Rect) {
        let shortcuts = "Arrows:move  Shift:select  PgUp/PgDn/wheel:scroll  Ctrl-L:toggle  Ctrl-Z:zen  Ctrl-R:reload settings  q:quit";
        let shortcuts_line =
            Paragraph::new(shortcuts).style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_widget(shortcuts_line, area);
    }
}

fn visible_lines(scroll_top: usize, height: usize, line_count: usize) -> Vec<LineRange> {
    if height == 0 || line_count == 0 {
        return Vec::new();
    }
    let last = (scroll_top + height - 1).min(line_count - 1);
    vec![LineRange::new(scroll_top.min(last), last)]
}

fn describe_outcome(outcome: Option<&RefreshOutcome>) -> String {
    match outcome {
        None => "-".to_string(),
        Some(RefreshOutcome::Applied {
            focus,
            strategy,
            dimmed,
        }) => {
            let source = match strategy {
                FocusStrategy::Symbol { name, .. } => format!("symbol {name}"),
                FocusStrategy::SymbolFallback => "selection (no symbol)".to_string(),
                FocusStrategy::Paragraph => "paragraph".to_string(),
                FocusStrategy::Selection => "selection".to_string(),
            };
            format!(
                "focus {}-{} via {source}, {dimmed} dimmed",
                focus.start_line + 1,
                focus.end_line + 1
            )
        }
        Some(RefreshOutcome::Cleared(reason)) => format!("cleared: {reason:?}"),
        Some(RefreshOutcome::Discarded(reason)) => format!("discarded: {reason:?}"),
        Some(RefreshOutcome::Deferred) => "waiting for scroll to settle".to_string(),
    }
}

fn expand_tabs(ch: char) -> String {
    if ch == '\t' {
        " ".repeat(TAB_WIDTH)
    } else {
        ch.to_string()
    }
}

fn display_column(text: &str, column: usize) -> usize {
    text.chars()
        .take(column)
        .map(|ch| if ch == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

fn styled_line(text: &str, line: usize, selection: &Selection, base: Style) -> Line<'static> {
    let selected = base.add_modifier(Modifier::REVERSED);
    let (start, end) = (selection.start(), selection.end());
    let in_selection = |column: usize| {
        let pos = Position::new(line, column);
        !selection.is_empty() && start <= pos && pos < end
    };

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_selected = false;
    for (column, ch) in text.chars().enumerate() {
        let is_selected = in_selection(column);
        if is_selected != run_selected && !run.is_empty() {
            let style = if run_selected { selected } else { base };
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        run_selected = is_selected;
        run.push_str(&expand_tabs(ch));
    }
    if !run.is_empty() {
        let style = if run_selected { selected } else { base };
        spans.push(Span::styled(run, style));
    }
    Line::from(spans)
}

fn main() -> io::Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            let program = env::args().next().unwrap_or_else(|| "limelight-tui".to_string());
            eprintln!("error: {message}");
            eprintln!("usage: {program} <file_path> [--settings settings.json] [--symbols outline.json]");
            process::exit(1);
        }
    };

    let log_path = init_logging()?;
    tracing::info!(log = %log_path.display(), file = %args.file_path.display(), "starting");

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = (|| -> io::Result<()> {
        let size = terminal.size()?;
        let height = size.height.saturating_sub(CHROME_ROWS) as usize;
        let mut app = App::new(args, height)?;
        run_app(&mut terminal, &mut app)
    })();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        let size = terminal.size()?;
        app.set_viewport_height(size.height.saturating_sub(CHROME_ROWS) as usize);
        terminal.draw(|f| app.render(f))?;

        if app.should_quit {
            break;
        }

        if event::poll(app.poll_timeout())? {
            match event::read()? {
                Event::Key(key) => app.handle_key_event(key),
                Event::Mouse(mouse) => app.handle_mouse_event(mouse),
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        app.tick();
    }

    app.controller.deactivate();
    Ok(())
}
