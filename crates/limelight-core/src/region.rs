//! Region finding: paragraph blocks and enclosing symbols.
//!
//! Both finders are pure with respect to the core's state. Paragraph finding reads only the
//! document snapshot; symbol finding additionally awaits the external [`SymbolProvider`].

use crate::document::{DocumentId, TextDocument};
use crate::error::FocusError;
use crate::position::{LineRange, Position};
use crate::symbols::{DocumentSymbol, SymbolKind, SymbolProvider};

/// Find the paragraph containing `line`.
///
/// A paragraph is a maximal run of non-blank lines. Blank (empty or whitespace-only) lines are
/// delimiters and never part of a paragraph; a blank `line` forms its own single-line paragraph.
///
/// Fails with [`FocusError::OutOfRange`] when `line` is not in the document. Use
/// [`paragraph_or_default`] where a range is always needed.
pub fn find_paragraph_range<D>(doc: &D, line: usize) -> Result<LineRange, FocusError>
where
    D: TextDocument + ?Sized,
{
    let line_count = doc.line_count();
    let out_of_range = || FocusError::OutOfRange { line, line_count };
    if line >= line_count {
        return Err(out_of_range());
    }
    let Some(is_blank) = doc.is_blank(line) else {
        return Err(out_of_range());
    };
    if is_blank {
        return Ok(LineRange::single(line));
    }

    // A line that vanished mid-scan counts as a delimiter.
    let non_blank = |idx: usize| doc.is_blank(idx) == Some(false);

    let mut start_line = line;
    while start_line > 0 && non_blank(start_line - 1) {
        start_line -= 1;
    }

    let mut end_line = line;
    while end_line + 1 < line_count && non_blank(end_line + 1) {
        end_line += 1;
    }

    // The document may have shrunk while scanning.
    let last = doc.line_count().saturating_sub(1);
    Ok(LineRange::new(start_line.min(last), end_line.min(last)))
}

/// Like [`find_paragraph_range`], substituting a single-line range at line 0 on failure.
pub fn paragraph_or_default<D>(doc: &D, line: usize) -> LineRange
where
    D: TextDocument + ?Sized,
{
    find_paragraph_range(doc, line).unwrap_or_else(|err| {
        tracing::error!(error = %err, "paragraph lookup failed, focusing line 0");
        LineRange::single(0)
    })
}

/// The symbol selected as the focus region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch {
    /// Lines spanned by the symbol.
    pub range: LineRange,
    /// Symbol name.
    pub name: String,
    /// Symbol kind.
    pub kind: SymbolKind,
    /// Nesting depth in the forest (roots are depth 0).
    pub depth: usize,
}

/// Find the innermost symbol in `symbols` containing `position`.
///
/// Only nodes whose range contains `position` are descended into. Among all containing nodes:
///
/// - deeper nodes always win over shallower ones, so a containing child overrides its ancestor
///   even when its line span is larger;
/// - at equal depth the smaller line span wins;
/// - remaining ties keep the first node in pre-order.
pub fn smallest_enclosing(symbols: &[DocumentSymbol], position: Position) -> Option<SymbolMatch> {
    let mut best: Option<(&DocumentSymbol, usize)> = None;
    let mut stack: Vec<(&DocumentSymbol, usize)> =
        symbols.iter().rev().map(|symbol| (symbol, 0)).collect();

    while let Some((symbol, depth)) = stack.pop() {
        if !symbol.range.contains(position) {
            continue;
        }

        let better = match best {
            None => true,
            Some((current, current_depth)) => {
                depth > current_depth
                    || (depth == current_depth
                        && symbol.range.line_span() < current.range.line_span())
            }
        };
        if better {
            best = Some((symbol, depth));
        }

        stack.extend(symbol.children.iter().rev().map(|child| (child, depth + 1)));
    }

    best.map(|(symbol, depth)| SymbolMatch {
        range: symbol.range.line_range(),
        name: symbol.name.clone(),
        kind: symbol.kind,
        depth,
    })
}

/// Ask `provider` for the symbol forest of `document` and pick the symbol enclosing `position`.
///
/// Returns `None` when the provider fails, returns nothing, or no symbol contains the position;
/// the caller is expected to fall back to another strategy.
pub async fn find_enclosing_symbol<P>(
    provider: &P,
    document: DocumentId,
    position: Position,
) -> Option<SymbolMatch>
where
    P: SymbolProvider + ?Sized,
{
    let symbols = match provider.document_symbols(document).await {
        Ok(symbols) => symbols,
        Err(err) => {
            tracing::error!(?document, error = %err, "symbol lookup failed");
            return None;
        }
    };

    if symbols.is_empty() {
        tracing::trace!(?document, "no symbols found in document");
        return None;
    }

    let found = smallest_enclosing(&symbols, position);
    match &found {
        Some(symbol) => tracing::trace!(
            name = %symbol.name,
            kind = ?symbol.kind,
            start = symbol.range.start_line,
            end = symbol.range.end_line,
            "found enclosing symbol"
        ),
        None => tracing::trace!(?position, "no enclosing symbol for position"),
    }
    found
}
