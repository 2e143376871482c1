use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{FoldingRange, Position};
use url::Url;

use super::point;
use crate::dispatch::{DispatchSource, FeatureDispatcher, ResultTranslator};
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::FeatureResult;
use crate::mapping::MappingSource;

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Folding ranges of every region, ordered by host start line.
    ///
    /// A fold is kept only when both of its ends map and it still spans more
    /// than one host line.
    pub fn folding_ranges(
        &self,
        host_uri: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<FoldingRange>> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch_documents(
            host_uri,
            Capability::FoldingRange,
            cancel,
            |engine, document, virtual_doc| {
                let folds = engine.folding_ranges(document)?;
                Ok(folds
                    .into_iter()
                    .filter_map(|fold| translate_fold(&translator, virtual_doc.uri(), fold))
                    .collect::<Vec<_>>())
            },
        )?;

        let mut folds: Vec<FoldingRange> = contributions.into_iter().flat_map(|c| c.value).collect();
        folds.sort_by_key(|fold| (fold.start_line, fold.end_line));
        folds.dedup_by_key(|fold| (fold.start_line, fold.end_line));
        Ok(folds)
    }
}

fn translate_fold<S: MappingSource + ?Sized>(
    translator: &ResultTranslator<'_, S>,
    virtual_uri: &Url,
    fold: FoldingRange,
) -> Option<FoldingRange> {
    let host_position = |line, character: Option<u32>| {
        let anchor = Position::new(line, character.unwrap_or(0));
        translator
            .range(virtual_uri, point(anchor), Some(Capability::FoldingRange))
            .map(|range| range.start)
    };
    let start = host_position(fold.start_line, fold.start_character)?;
    let end = host_position(fold.end_line, fold.end_character)?;
    if end.line <= start.line {
        return None;
    }
    Some(FoldingRange {
        start_line: start.line,
        start_character: fold.start_character.map(|_| start.character),
        end_line: end.line,
        end_character: fold.end_character.map(|_| end.character),
        ..fold
    })
}
