//! A [`SymbolProvider`] backed by an LSP `textDocument/documentSymbol` request.
//!
//! The crate does not own a language server connection. The host supplies a fetch closure that
//! issues the request however it likes (a JSON-RPC client, a cached outline, a file) and returns
//! the raw result together with the snapshot it was computed for.

use crate::lsp_symbols::lsp_document_symbols;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use limelight_core::{DocumentId, DocumentSnapshot, DocumentSymbol, FocusError, SymbolProvider};
use serde_json::Value;
use std::future::Future;

/// Raw `textDocument/documentSymbol` result and the document state it describes.
#[derive(Debug, Clone)]
pub struct SymbolResponse {
    /// Snapshot used to convert UTF-16 columns.
    pub snapshot: DocumentSnapshot,
    /// The JSON `result` member of the response.
    pub result: Value,
}

type Fetch = Box<dyn Fn(DocumentId) -> LocalBoxFuture<'static, Result<SymbolResponse, FocusError>>>;

/// Symbol provider that converts LSP payloads on the fly.
pub struct LspSymbolProvider {
    fetch: Fetch,
}

impl LspSymbolProvider {
    /// Wrap a fetch closure. Return [`FocusError::ProviderUnavailable`] from it when no server
    /// is available; the core then falls back to selection-based focus.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(DocumentId) -> Fut + 'static,
        Fut: Future<Output = Result<SymbolResponse, FocusError>> + 'static,
    {
        Self {
            fetch: Box::new(move |document| fetch(document).boxed_local()),
        }
    }
}

impl std::fmt::Debug for LspSymbolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LspSymbolProvider").finish_non_exhaustive()
    }
}

#[async_trait(?Send)]
impl SymbolProvider for LspSymbolProvider {
    async fn document_symbols(
        &self,
        document: DocumentId,
    ) -> Result<Vec<DocumentSymbol>, FocusError> {
        let response = (self.fetch)(document).await?;
        if response.snapshot.id() != document {
            return Err(FocusError::StaleSnapshot {
                reason: "symbol response is for another document",
            });
        }
        let symbols = lsp_document_symbols(&response.snapshot, &response.result);
        tracing::trace!(?document, roots = symbols.len(), "converted lsp symbols");
        Ok(symbols)
    }
}
