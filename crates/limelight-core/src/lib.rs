#![warn(missing_docs)]
//! Limelight Core - Headless Focus Highlighting for Text Editors
//!
//! # Overview
//!
//! `limelight-core` dims every line of the visible window except the block the user is working
//! on: the paragraph around the caret, the selection, or the innermost document symbol. It does
//! not render anything. The host supplies the active view, a symbol source and a decoration sink,
//! and the core decides which lines to dim and when.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Driver (event loop, debounce timer)        │  ← Host integration
//! ├─────────────────────────────────────────────┤
//! │  RefreshController + FocusState             │  ← State machine
//! ├─────────────────────────────────────────────┤
//! │  FocusResolver / DecorationPlanner          │  ← Per-refresh computation
//! ├─────────────────────────────────────────────┤
//! │  Region finders / ScrollVelocityTracker     │  ← Pure building blocks
//! ├─────────────────────────────────────────────┤
//! │  Document snapshot (Rope-based)             │  ← Text access
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use limelight_core::{LineRange, VisibleWindow, find_paragraph_range, plan};
//!
//! let lines = ["A", "B", "", "C", "D", "", "E"];
//! let focus = find_paragraph_range(&lines[..], 3).unwrap();
//! assert_eq!(focus, LineRange::new(3, 4));
//!
//! let window = VisibleWindow::new(LineRange::new(0, 6));
//! let dimmed: Vec<usize> = plan(&window, &focus, &lines[..])
//!     .iter()
//!     .map(|r| r.line)
//!     .collect();
//! assert_eq!(dimmed, vec![0, 1, 2, 5, 6]);
//! ```
//!
//! A full host wires a [`RefreshController`] to its views and feeds it [`FocusEvent`]s, either
//! directly or through [`driver::run`].
//!
//! # Module Description
//!
//! - [`position`] - Positions, selections and inclusive line ranges
//! - [`document`] - Read-only document access and Rope snapshots
//! - [`symbols`] - Document symbol model and the async provider trait
//! - [`region`] - Paragraph and enclosing-symbol finders
//! - [`resolver`] - Focus region selection
//! - [`decorations`] - Dim range planning and the decoration sink
//! - [`scroll`] - Fast-scroll detection
//! - [`config`] - Settings and their loading
//! - [`state`] - Persistent focus state and refresh generations
//! - [`controller`] - The refresh state machine
//! - [`driver`] - Async event loop

pub mod config;
pub mod controller;
pub mod decorations;
pub mod document;
pub mod driver;
pub mod error;
pub mod outcome;
pub mod position;
pub mod region;
pub mod resolver;
pub mod scroll;
pub mod state;
pub mod symbols;
pub mod view;

pub use config::{BlockDetection, ConfigChange, ConfigSource, FocusConfig, JsonSettings, NAMESPACE};
pub use controller::{
    FocusEvent, FocusHost, PendingRefresh, Reaction, RefreshController, ResolvedRefresh,
};
pub use decorations::{
    DecorationSink, DimRange, DimStyle, SharedDecorations, SinkCall, StyleHandle, plan,
};
pub use document::{DocumentId, DocumentSnapshot, TextDocument};
pub use error::FocusError;
pub use outcome::{ClearReason, RefreshOutcome, StaleReason};
pub use position::{LineRange, Position, Selection};
pub use region::{
    SymbolMatch, find_enclosing_symbol, find_paragraph_range, paragraph_or_default,
    smallest_enclosing,
};
pub use resolver::{FocusResolver, FocusStrategy, ResolvedFocus};
pub use scroll::{ScrollSample, ScrollVelocityTracker};
pub use state::{FocusMode, FocusState, Generation};
pub use symbols::{
    DocumentSymbol, NoSymbols, StaticSymbols, SymbolKind, SymbolProvider, SymbolRange,
};
pub use view::{ActiveView, SharedView, ViewProvider, VisibleWindow};
