//! Helpers for converting LSP symbol payloads into the core's symbol forest.
//!
//! This module intentionally avoids pulling in `lsp-types`. It parses the subset of a
//! `textDocument/documentSymbol` result that focus detection needs: names, kinds, ranges and
//! nesting.

use crate::lsp_sync::{LspCoordinateConverter, LspPosition, LspRange};
use limelight_core::{DocumentSymbol, SymbolKind, SymbolRange, TextDocument};
use serde_json::Value;

fn parse_lsp_position(value: &Value) -> Option<LspPosition> {
    Some(LspPosition {
        line: u32::try_from(value.get("line")?.as_u64()?).ok()?,
        character: u32::try_from(value.get("character")?.as_u64()?).ok()?,
    })
}

fn parse_lsp_range(value: &Value) -> Option<LspRange> {
    Some(LspRange {
        start: parse_lsp_position(value.get("start")?)?,
        end: parse_lsp_position(value.get("end")?)?,
    })
}

fn symbol_range<D>(doc: &D, range: &LspRange) -> SymbolRange
where
    D: TextDocument + ?Sized,
{
    SymbolRange::new(
        LspCoordinateConverter::lsp_to_position(doc, range.start),
        LspCoordinateConverter::lsp_to_position(doc, range.end),
    )
}

fn parse_kind(value: &Value) -> Option<SymbolKind> {
    let kind = u32::try_from(value.get("kind")?.as_u64()?).ok()?;
    Some(symbol_kind_from_lsp(kind))
}

/// Map an LSP `SymbolKind` number onto the core's coarse kinds.
pub fn symbol_kind_from_lsp(kind: u32) -> SymbolKind {
    match kind {
        1..=4 => SymbolKind::Module,
        5 | 19 | 23 => SymbolKind::Class,
        6 | 9 => SymbolKind::Method,
        7 | 8 | 22 => SymbolKind::Field,
        10 => SymbolKind::Enum,
        11 => SymbolKind::Interface,
        12 => SymbolKind::Function,
        13 | 14 => SymbolKind::Variable,
        other => SymbolKind::Other(other),
    }
}

fn parse_document_symbol<D>(doc: &D, value: &Value) -> Option<DocumentSymbol>
where
    D: TextDocument + ?Sized,
{
    let name = value.get("name")?.as_str()?;
    let kind = parse_kind(value)?;
    // `selectionRange` is required by the protocol and distinguishes this shape from
    // `SymbolInformation`.
    value.get("selectionRange")?;
    let range = parse_lsp_range(value.get("range")?)?;

    let children = value
        .get("children")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|child| parse_document_symbol(doc, child))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Some(DocumentSymbol::new(name, kind, symbol_range(doc, &range)).with_children(children))
}

fn parse_symbol_information<D>(doc: &D, value: &Value) -> Option<DocumentSymbol>
where
    D: TextDocument + ?Sized,
{
    let name = value.get("name")?.as_str()?;
    let kind = parse_kind(value)?;
    let range = parse_lsp_range(value.get("location")?.get("range")?)?;
    Some(DocumentSymbol::new(name, kind, symbol_range(doc, &range)))
}

/// Convert an LSP `textDocument/documentSymbol` result payload into a symbol forest.
///
/// Supported shapes:
/// - `DocumentSymbol[]` (hierarchical)
/// - `SymbolInformation[]` (flat; every symbol becomes a root)
///
/// `doc` must be the document state the server computed the payload for; it is used to turn
/// UTF-16 columns into character columns. Malformed entries are skipped, and a `null` result
/// yields an empty forest.
pub fn lsp_document_symbols<D>(doc: &D, result: &Value) -> Vec<DocumentSymbol>
where
    D: TextDocument + ?Sized,
{
    let Some(arr) = result.as_array() else {
        return Vec::new();
    };

    let mut symbols = Vec::<DocumentSymbol>::with_capacity(arr.len());
    for item in arr {
        if let Some(sym) = parse_document_symbol(doc, item) {
            symbols.push(sym);
            continue;
        }
        if let Some(sym) = parse_symbol_information(doc, item) {
            symbols.push(sym);
            continue;
        }
        tracing::trace!(%item, "skipping malformed symbol entry");
    }

    symbols
}
