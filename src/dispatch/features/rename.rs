use log::debug;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{Position, Range, WorkspaceEdit};
use url::Url;

use super::point;
use crate::dispatch::translate::merge_workspace_edits;
use crate::dispatch::{DispatchSource, FanOut, FeatureDispatcher, ResultTranslator};
use crate::edit::EditTranslator;
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::{FeatureResult, RequestCancelled};

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Host range of the symbol under `position`, from the first region able
    /// to rename it.
    pub fn prepare_rename(
        &self,
        host_uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<Range>> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::Rename,
            FanOut::FirstNonEmpty,
            cancel,
            |engine, document, region| {
                let range = engine.prepare_rename(document, region.virtual_range.start)?;
                Ok(range.and_then(|range| {
                    translator.range(region.virtual_uri(), range, Some(Capability::Rename))
                }))
            },
        )?;
        Ok(contributions.into_iter().find_map(|contribution| contribution.value))
    }

    /// Rename in every region at `position`, merged into one host edit.
    ///
    /// Edits landing in scaffolding or in mappings that do not grant rename
    /// are dropped individually.
    pub fn rename(
        &self,
        host_uri: &Url,
        position: Position,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<WorkspaceEdit>> {
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::Rename,
            FanOut::All,
            cancel,
            |engine, document, region| engine.rename(document, region.virtual_range.start, new_name),
        )?;

        let edits = contributions.into_iter().filter_map(|c| c.value).collect();
        let Some(merged) = merge_workspace_edits(edits) else {
            return Ok(None);
        };
        let translated = EditTranslator::with_capability(self.source(), Capability::Rename)
            .translate_workspace_edit(merged);
        if translated.is_none() {
            debug!(target: "mosaic::dispatch", "rename in {} produced no host edits", host_uri);
        }
        Ok(translated)
    }

    /// Reference updates for a file moved from `old` to `new`.
    pub fn file_rename_edits(
        &self,
        old: &Url,
        new: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<WorkspaceEdit>> {
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }
        let edit = match self.engine().file_rename_edits(old, new) {
            Ok(edit) => edit,
            Err(e) => {
                debug!(target: "mosaic::dispatch", "file rename {} -> {} failed: {}", old, new, e);
                None
            }
        };
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }

        Ok(edit.and_then(|edit| {
            EditTranslator::with_capability(self.source(), Capability::Rename)
                .translate_workspace_edit(edit)
        }))
    }
}
