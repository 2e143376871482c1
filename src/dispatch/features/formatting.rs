use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{FormattingOptions, TextEdit};
use url::Url;

use crate::dispatch::{DispatchSource, FeatureDispatcher};
use crate::edit::EditTranslator;
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::FeatureResult;

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Format every embedded region of `host_uri`.
    ///
    /// Edits are merged across virtual documents with the usual conflict
    /// rules; only edits of `host_uri` itself are returned.
    pub fn formatting(
        &self,
        host_uri: &Url,
        options: &FormattingOptions,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<TextEdit>> {
        let contributions = self.dispatch_documents(
            host_uri,
            Capability::Formatting,
            cancel,
            |engine, document, _| engine.formatting(document, options),
        )?;

        let files = contributions
            .into_iter()
            .map(|c| (c.document.uri().clone(), c.value));
        let mut host_edits =
            EditTranslator::with_capability(self.source(), Capability::Formatting).translate_batch(files);
        Ok(host_edits.remove(host_uri).unwrap_or_default())
    }
}
