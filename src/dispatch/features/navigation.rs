use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{DocumentHighlight, Location, Position};
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
    /// Locations from the first region whose translated answer is non-empty.
    pub fn definition(
        &self,
        host_uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<Location>> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::Definition,
            FanOut::FirstNonEmpty,
            cancel,
            |engine, document, region| {
                let locations = engine.definition(document, region.virtual_range.start)?;
                Ok(translator.locations(locations))
            },
        )?;
        Ok(contributions
            .into_iter()
            .next()
            .map(|contribution| contribution.value)
            .unwrap_or_default())
    }

    pub fn type_definition(
        &self,
        host_uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<Location>> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::TypeDefinition,
            FanOut::FirstNonEmpty,
            cancel,
            |engine, document, region| {
                let locations = engine.type_definition(document, region.virtual_range.start)?;
                Ok(translator.locations(locations))
            },
        )?;
        Ok(contributions
            .into_iter()
            .next()
            .map(|contribution| contribution.value)
            .unwrap_or_default())
    }

    /// Union of the references every region reports, without duplicates.
    pub fn references(
        &self,
        host_uri: &Url,
        position: Position,
        include_declaration: bool,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<Location>> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::References,
            FanOut::All,
            cancel,
            |engine, document, region| {
                let locations =
                    engine.references(document, region.virtual_range.start, include_declaration)?;
                Ok(translator.locations(locations))
            },
        )?;

        let mut references: Vec<Location> = Vec::new();
        for location in contributions.into_iter().flat_map(|c| c.value) {
            if !references.contains(&location) {
                references.push(location);
            }
        }
        Ok(references)
    }

    pub fn document_highlights(
        &self,
        host_uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<DocumentHighlight>> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::DocumentHighlight,
            FanOut::All,
            cancel,
            |engine, document, region| {
                let highlights = engine.document_highlights(document, region.virtual_range.start)?;
                Ok(highlights
                    .into_iter()
                    .filter_map(|highlight| {
                        let range = translator.range(region.virtual_uri(), highlight.range, None)?;
                        Some(DocumentHighlight { range, ..highlight })
                    })
                    .collect::<Vec<_>>())
            },
        )?;

        let mut highlights: Vec<DocumentHighlight> = Vec::new();
        for highlight in contributions.into_iter().flat_map(|c| c.value) {
            if !highlights.contains(&highlight) {
                highlights.push(highlight);
            }
        }
        Ok(highlights)
    }
}
