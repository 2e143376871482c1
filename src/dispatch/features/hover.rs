use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{Hover, Position};
use url::Url;

use super::point;
use crate::dispatch::{DispatchSource, FanOut, FeatureDispatcher, ResultTranslator};
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::FeatureResult;

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Hover from the first region at `position` that has one. The hover range
    /// is dropped when it does not map back.
    pub fn hover(
        &self,
        host_uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<Hover>> {
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::Hover,
            FanOut::FirstNonEmpty,
            cancel,
            |engine, document, region| engine.hover(document, region.virtual_range.start),
        )?;

        let translator = ResultTranslator::new(self.source());
        Ok(contributions.into_iter().find_map(|contribution| {
            let hover = contribution.value?;
            let range = hover
                .range
                .and_then(|range| translator.range(contribution.region.virtual_uri(), range, None));
            Some(Hover { range, ..hover })
        }))
    }
}
