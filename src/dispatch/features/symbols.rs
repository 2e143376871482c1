use log::debug;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{DocumentSymbol, SymbolInformation};
use url::Url;

use crate::dispatch::{DispatchSource, FeatureDispatcher, ResultTranslator};
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::{FeatureResult, RequestCancelled};

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Outline of `host_uri` assembled from every region, ordered by position.
    pub fn document_symbols(
        &self,
        host_uri: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<DocumentSymbol>> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch_documents(
            host_uri,
            Capability::DocumentSymbol,
            cancel,
            |engine, document, virtual_doc| {
                let symbols = engine.document_symbols(document)?;
                Ok(translator.document_symbols(virtual_doc.uri(), symbols))
            },
        )?;

        let mut symbols: Vec<DocumentSymbol> = contributions.into_iter().flat_map(|c| c.value).collect();
        symbols.sort_by_key(|symbol| symbol.range.start);
        Ok(symbols)
    }

    /// Workspace-wide symbol search. Symbols in documents the host does not
    /// track are skipped.
    pub fn workspace_symbols(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<SymbolInformation>> {
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }
        let symbols = self.engine().workspace_symbols(query).unwrap_or_else(|e| {
            debug!(target: "mosaic::dispatch", "workspace symbol search failed: {}", e);
            Vec::new()
        });
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }

        let translator = ResultTranslator::new(self.source());
        Ok(symbols
            .into_iter()
            .filter_map(|symbol| translator.workspace_symbol(symbol))
            .collect())
    }
}
