#![warn(missing_docs)]
//! `limelight-lsp` - LSP integration for `limelight-core`.
//!
//! This crate turns `textDocument/documentSymbol` results into the symbol forest the core
//! searches for symbol-based focus, converting UTF-16 columns to character columns on the way.
//! It does not talk to a server itself; [`LspSymbolProvider`] wraps whatever request function
//! the host already has.

pub mod lsp_symbols;
pub mod lsp_sync;
pub mod provider;

pub use lsp_symbols::{lsp_document_symbols, symbol_kind_from_lsp};
pub use lsp_sync::{LspCoordinateConverter, LspPosition, LspRange};
pub use provider::{LspSymbolProvider, SymbolResponse};
