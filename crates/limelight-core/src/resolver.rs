//! Focus resolution: picks the one line range that stays undimmed.

use crate::config::{BlockDetection, FocusConfig};
use crate::document::{DocumentId, TextDocument};
use crate::error::FocusError;
use crate::position::{LineRange, Selection};
use crate::region::{find_enclosing_symbol, paragraph_or_default};
use crate::symbols::{SymbolKind, SymbolProvider};

/// Which strategy produced a focus region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusStrategy {
    /// The innermost symbol enclosing the caret.
    Symbol {
        /// Symbol name.
        name: String,
        /// Symbol kind.
        kind: SymbolKind,
    },
    /// Symbol detection was requested but found nothing; the selected lines were used.
    SymbolFallback,
    /// The paragraph containing the caret.
    Paragraph,
    /// The selected lines.
    Selection,
}

/// Result of resolving the focus region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFocus {
    /// Lines that must not be dimmed.
    pub region: LineRange,
    /// Strategy that produced `region` (before widening to the selection).
    pub strategy: FocusStrategy,
    /// True if the region was widened to keep a non-empty selection visible.
    pub widened: bool,
}

/// Combines the selection, the detection settings and the region finders.
pub struct FocusResolver<'a, P: SymbolProvider + ?Sized> {
    config: &'a FocusConfig,
    symbols: &'a P,
}

impl<'a, P: SymbolProvider + ?Sized> FocusResolver<'a, P> {
    /// Create a resolver for one refresh cycle.
    pub fn new(config: &'a FocusConfig, symbols: &'a P) -> Self {
        Self { config, symbols }
    }

    /// Resolve the focus region for `selection` in `doc`.
    ///
    /// Suspends on the symbol provider when symbol detection is configured. A non-empty
    /// selection is always kept fully visible, whatever the strategy returned.
    ///
    /// Fails with [`FocusError::OutOfRange`] if the region does not fit in `doc`, which happens
    /// when the selection belongs to a newer document state than the snapshot.
    pub async fn resolve<D>(
        &self,
        doc: &D,
        document: DocumentId,
        selection: Selection,
    ) -> Result<ResolvedFocus, FocusError>
    where
        D: TextDocument + ?Sized,
    {
        let selected = selection.line_range();

        let (region, strategy) = match self.config.block_detection {
            BlockDetection::DocumentSymbols => {
                match find_enclosing_symbol(self.symbols, document, selection.active).await {
                    Some(symbol) => (
                        symbol.range,
                        FocusStrategy::Symbol {
                            name: symbol.name,
                            kind: symbol.kind,
                        },
                    ),
                    None => (selected, FocusStrategy::SymbolFallback),
                }
            }
            BlockDetection::Paragraph if self.config.paragraph_mode => (
                paragraph_or_default(doc, selection.active.line),
                FocusStrategy::Paragraph,
            ),
            BlockDetection::Paragraph => (selected, FocusStrategy::Selection),
        };

        let (region, widened) = if selection.is_empty() {
            (region, false)
        } else {
            let covered = region.cover(&selected);
            (covered, covered != region)
        };

        let line_count = doc.line_count();
        if !region.fits(line_count) {
            return Err(FocusError::OutOfRange {
                line: region.end_line,
                line_count,
            });
        }

        Ok(ResolvedFocus {
            region,
            strategy,
            widened,
        })
    }
}
