use log::debug;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{
    CompletionItem, CompletionTextEdit, InsertReplaceEdit, Position, TextEdit,
};
use url::Url;

use super::point;
use crate::dispatch::translate::{unwrap_data, wrap_data};
use crate::dispatch::{DispatchSource, FanOut, FeatureDispatcher};
use crate::edit::EditTranslator;
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::{FeatureResult, RequestCancelled};
use crate::mapping::MappingSource;

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Completion items of every region at `position`.
    ///
    /// Items whose edits cannot be placed in the host are dropped. Each kept
    /// item remembers its virtual document for `completionItem/resolve`.
    pub fn completion(
        &self,
        host_uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CompletionItem>> {
        let translator = EditTranslator::new(self.source());
        let current_directory = self.source().current_directory();
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::Completion,
            FanOut::All,
            cancel,
            |engine, document, region| {
                let items = engine.completion(document, region.virtual_range.start, &current_directory)?;
                let total = items.len();
                let items: Vec<CompletionItem> = items
                    .into_iter()
                    .filter_map(|item| translate_item(&translator, region.virtual_uri(), item))
                    .collect();
                if items.len() < total {
                    debug!(
                        target: "mosaic::dispatch",
                        "dropped {} completion items of {} with unmappable edits",
                        total - items.len(),
                        region.virtual_uri()
                    );
                }
                Ok(items)
            },
        )?;
        Ok(contributions.into_iter().flat_map(|c| c.value).collect())
    }

    /// Resolve an item produced by [`Self::completion`].
    ///
    /// Items we did not produce, or whose virtual document is gone, come back
    /// unchanged.
    pub fn resolve_completion(
        &self,
        item: CompletionItem,
        cancel: &CancellationToken,
    ) -> FeatureResult<CompletionItem> {
        let Some((virtual_uri, original)) = unwrap_data(item.data.as_ref()) else {
            return Ok(item);
        };
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }
        let Some(document) = self.source().valid_document(&virtual_uri) else {
            debug!(target: "mosaic::dispatch", "{} is gone, not resolving", virtual_uri);
            return Ok(item);
        };

        // The engine only understands virtual coordinates; host edits stay here.
        let host_item = item.clone();
        let request = CompletionItem {
            data: original,
            text_edit: None,
            additional_text_edits: None,
            ..item
        };
        let resolved = match self.engine().resolve_completion(&document, request) {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(target: "mosaic::dispatch", "resolving completion in {} failed: {}", virtual_uri, e);
                return Ok(host_item);
            }
        };
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }

        let translator = EditTranslator::new(self.source());
        let text_edit = match resolved.text_edit {
            Some(edit) => translate_text_edit(&translator, &virtual_uri, edit).or(host_item.text_edit),
            None => host_item.text_edit,
        };
        let additional_text_edits = match resolved.additional_text_edits {
            Some(edits) => translate_edits(&translator, &virtual_uri, &edits)
                .or(host_item.additional_text_edits),
            None => host_item.additional_text_edits,
        };
        Ok(CompletionItem {
            text_edit,
            additional_text_edits,
            data: host_item.data,
            ..resolved
        })
    }
}

fn translate_item<S: MappingSource + ?Sized>(
    translator: &EditTranslator<'_, S>,
    virtual_uri: &Url,
    item: CompletionItem,
) -> Option<CompletionItem> {
    let text_edit = match item.text_edit {
        Some(edit) => Some(translate_text_edit(translator, virtual_uri, edit)?),
        None => None,
    };
    let additional_text_edits = match item.additional_text_edits {
        Some(edits) => Some(translate_edits(translator, virtual_uri, &edits)?),
        None => None,
    };
    Some(CompletionItem {
        text_edit,
        additional_text_edits,
        data: wrap_data(virtual_uri, item.data),
        ..item
    })
}

fn translate_text_edit<S: MappingSource + ?Sized>(
    translator: &EditTranslator<'_, S>,
    virtual_uri: &Url,
    edit: CompletionTextEdit,
) -> Option<CompletionTextEdit> {
    match edit {
        CompletionTextEdit::Edit(edit) => {
            let host = translator.translate(&edit, virtual_uri)?;
            Some(CompletionTextEdit::Edit(host.edit))
        }
        CompletionTextEdit::InsertAndReplace(edit) => {
            let range_of = |range| {
                let placeholder = TextEdit {
                    range,
                    new_text: edit.new_text.clone(),
                };
                translator.translate(&placeholder, virtual_uri).map(|host| host.edit.range)
            };
            Some(CompletionTextEdit::InsertAndReplace(InsertReplaceEdit {
                insert: range_of(edit.insert)?,
                replace: range_of(edit.replace)?,
                new_text: edit.new_text,
            }))
        }
    }
}

/// All of `edits` in host coordinates, or `None` if any of them does not map.
fn translate_edits<S: MappingSource + ?Sized>(
    translator: &EditTranslator<'_, S>,
    virtual_uri: &Url,
    edits: &[TextEdit],
) -> Option<Vec<TextEdit>> {
    edits
        .iter()
        .map(|edit| translator.translate(edit, virtual_uri).map(|host| host.edit))
        .collect()
}
