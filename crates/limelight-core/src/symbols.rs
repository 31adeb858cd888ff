//! Document symbol forest and the provider seam.
//!
//! Symbols come from an external provider (usually a language server). The core never parses
//! source text itself; it only searches the forest it is given for the node enclosing the caret.

use crate::document::DocumentId;
use crate::error::FocusError;
use crate::position::{LineRange, Position};
use async_trait::async_trait;

/// An inclusive span between two logical positions.
///
/// Containment is inclusive on both ends, matching how editors report symbol ranges (a caret
/// sitting right after a closing brace is still "in" the symbol).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRange {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (inclusive).
    pub end: Position,
}

impl SymbolRange {
    /// Create a new symbol range; the bounds are swapped if given in reverse.
    pub fn new(start: Position, end: Position) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Returns true if `position` lies within the range.
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    /// The lines spanned by the range.
    pub fn line_range(&self) -> LineRange {
        LineRange::new(self.start.line, self.end.line)
    }

    /// Number of line breaks spanned (`end.line - start.line`).
    pub fn line_span(&self) -> usize {
        self.end.line - self.start.line
    }
}

/// A coarse symbol kind tag, used for logging which symbol won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Module, namespace or package.
    Module,
    /// Class, struct or object type.
    Class,
    /// Enum type.
    Enum,
    /// Interface or trait.
    Interface,
    /// Free function.
    Function,
    /// Method or constructor.
    Method,
    /// Field, property or enum member.
    Field,
    /// Variable or constant.
    Variable,
    /// Anything else, carrying the provider's raw kind value.
    Other(u32),
}

/// A single node of the symbol forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSymbol {
    /// Symbol name (e.g. function name).
    pub name: String,
    /// Symbol kind.
    pub kind: SymbolKind,
    /// Full span of the symbol.
    pub range: SymbolRange,
    /// Nested symbols.
    pub children: Vec<DocumentSymbol>,
}

impl DocumentSymbol {
    /// Create a leaf symbol.
    pub fn new(name: impl Into<String>, kind: SymbolKind, range: SymbolRange) -> Self {
        Self {
            name: name.into(),
            kind,
            range,
            children: Vec::new(),
        }
    }

    /// Attach children to this symbol.
    pub fn with_children(mut self, children: Vec<DocumentSymbol>) -> Self {
        self.children = children;
        self
    }
}

/// Source of document symbols.
///
/// Implementations may take arbitrarily long; callers treat each call as cancellable and discard
/// results that arrive after the document or selection has moved on. An error or an empty
/// forest both mean "no symbols" and trigger the caller's fallback.
#[async_trait(?Send)]
pub trait SymbolProvider {
    /// Return the symbol forest for `document`.
    async fn document_symbols(&self, document: DocumentId)
    -> Result<Vec<DocumentSymbol>, FocusError>;
}

/// A provider with no symbols at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbols;

#[async_trait(?Send)]
impl SymbolProvider for NoSymbols {
    async fn document_symbols(
        &self,
        _document: DocumentId,
    ) -> Result<Vec<DocumentSymbol>, FocusError> {
        Ok(Vec::new())
    }
}

/// A provider that always returns the same forest, regardless of document.
///
/// Useful for hosts that compute an outline once per document version themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticSymbols {
    symbols: Vec<DocumentSymbol>,
}

impl StaticSymbols {
    /// Wrap a precomputed forest.
    pub fn new(symbols: Vec<DocumentSymbol>) -> Self {
        Self { symbols }
    }
}

#[async_trait(?Send)]
impl SymbolProvider for StaticSymbols {
    async fn document_symbols(
        &self,
        _document: DocumentId,
    ) -> Result<Vec<DocumentSymbol>, FocusError> {
        Ok(self.symbols.clone())
    }
}
