use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{Position, SelectionRange};
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
    /// One selection range per position, in request order.
    ///
    /// Positions outside every region, or whose chain does not map back, get
    /// an empty range at the position itself so the result stays aligned with
    /// the request.
    pub fn selection_ranges(
        &self,
        host_uri: &Url,
        positions: &[Position],
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<SelectionRange>> {
        let translator = ResultTranslator::new(self.source());
        let mut ranges = Vec::with_capacity(positions.len());
        for &position in positions {
            let contributions = self.dispatch(
                host_uri,
                point(position),
                Capability::SelectionRange,
                FanOut::FirstNonEmpty,
                cancel,
                |engine, document, region| {
                    let chains =
                        engine.selection_ranges(document, &[region.virtual_range.start])?;
                    Ok(chains
                        .into_iter()
                        .next()
                        .and_then(|chain| translator.selection_range(region.virtual_uri(), chain)))
                },
            )?;
            let range = contributions
                .into_iter()
                .find_map(|contribution| contribution.value)
                .unwrap_or(SelectionRange {
                    range: point(position),
                    parent: None,
                });
            ranges.push(range);
        }
        Ok(ranges)
    }
}
