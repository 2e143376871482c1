use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{Position, SignatureHelp};
use url::Url;

use super::point;
use crate::dispatch::{DispatchSource, FanOut, FeatureDispatcher};
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::FeatureResult;

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Signature help carries no coordinates and is returned as the engine
    /// produced it.
    pub fn signature_help(
        &self,
        host_uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<SignatureHelp>> {
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::SignatureHelp,
            FanOut::FirstNonEmpty,
            cancel,
            |engine, document, region| engine.signature_help(document, region.virtual_range.start),
        )?;
        Ok(contributions.into_iter().find_map(|contribution| contribution.value))
    }
}
