use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::Diagnostic;
use url::Url;

use crate::dispatch::{DispatchSource, FeatureDispatcher, ResultTranslator};
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::FeatureResult;

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Diagnostics of every virtual document with diagnostic mappings, in
    /// host coordinates. Diagnostics raised on scaffolding are dropped.
    pub fn diagnostics(
        &self,
        host_uri: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<Diagnostic>> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch_documents(
            host_uri,
            Capability::Diagnostic,
            cancel,
            |engine, document, virtual_doc| {
                let diagnostics = engine.diagnostics(document)?;
                Ok(diagnostics
                    .into_iter()
                    .filter_map(|diagnostic| translator.diagnostic(virtual_doc.uri(), diagnostic))
                    .collect::<Vec<_>>())
            },
        )?;
        Ok(contributions.into_iter().flat_map(|c| c.value).collect())
    }
}
