use log::debug;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{CodeAction, CodeActionContext, Diagnostic, Range};
use url::Url;

use crate::dispatch::translate::{unwrap_data, wrap_data};
use crate::dispatch::{DispatchSource, FanOut, FeatureDispatcher, ResultTranslator};
use crate::edit::EditTranslator;
use crate::embedding::{Capability, VirtualDocument};
use crate::engine::LanguageEngine;
use crate::error::{FeatureResult, RequestCancelled};
use crate::mapping::{MappingSource, RangeMapper};

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Code actions of every region overlapping `range`.
    ///
    /// Context diagnostics are forwarded only to the virtual document they map
    /// into. Actions whose edit does not survive translation are dropped.
    pub fn code_actions(
        &self,
        host_uri: &Url,
        range: Range,
        context: &CodeActionContext,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CodeAction>> {
        let results = ResultTranslator::new(self.source());
        let edits = EditTranslator::with_capability(self.source(), Capability::CodeAction);
        let contributions = self.dispatch(
            host_uri,
            range,
            Capability::CodeAction,
            FanOut::All,
            cancel,
            |engine, document, region| {
                let virtual_context = CodeActionContext {
                    diagnostics: diagnostics_in(self.source(), host_uri, &region.document, &context.diagnostics),
                    ..context.clone()
                };
                let actions = engine.code_actions(document, region.virtual_range, &virtual_context)?;
                Ok(actions
                    .into_iter()
                    .filter_map(|action| translate_action(&results, &edits, region.virtual_uri(), action))
                    .collect::<Vec<_>>())
            },
        )?;
        Ok(contributions.into_iter().flat_map(|c| c.value).collect())
    }

    /// Resolve an action produced by [`Self::code_actions`].
    pub fn resolve_code_action(
        &self,
        action: CodeAction,
        cancel: &CancellationToken,
    ) -> FeatureResult<CodeAction> {
        let Some((virtual_uri, original)) = unwrap_data(action.data.as_ref()) else {
            return Ok(action);
        };
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }
        let Some(document) = self.source().valid_document(&virtual_uri) else {
            debug!(target: "mosaic::dispatch", "{} is gone, not resolving", virtual_uri);
            return Ok(action);
        };

        // Host-coordinate fields are kept back and restored afterwards.
        let host_action = action.clone();
        let request = CodeAction {
            data: original,
            edit: None,
            diagnostics: None,
            ..action
        };
        let resolved = match self.engine().resolve_code_action(&document, request) {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(target: "mosaic::dispatch", "resolving code action in {} failed: {}", virtual_uri, e);
                return Ok(host_action);
            }
        };
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }

        let edit = match resolved.edit {
            Some(edit) => EditTranslator::with_capability(self.source(), Capability::CodeAction)
                .translate_workspace_edit(edit),
            None => host_action.edit,
        };
        Ok(CodeAction {
            edit,
            diagnostics: host_action.diagnostics,
            data: host_action.data,
            ..resolved
        })
    }
}

/// Context diagnostics whose host range maps into `document`, in its
/// coordinates.
fn diagnostics_in<S: MappingSource + ?Sized>(
    source: &S,
    host_uri: &Url,
    document: &VirtualDocument,
    diagnostics: &[Diagnostic],
) -> Vec<Diagnostic> {
    let mapper = RangeMapper::new(source);
    diagnostics
        .iter()
        .filter_map(|diagnostic| {
            let mapped = mapper
                .to_virtual(host_uri, diagnostic.range)
                .into_iter()
                .find(|m| m.virtual_uri() == document.uri())?;
            Some(Diagnostic {
                range: mapped.virtual_range,
                ..diagnostic.clone()
            })
        })
        .collect()
}

fn translate_action<S: MappingSource + ?Sized>(
    results: &ResultTranslator<'_, S>,
    edits: &EditTranslator<'_, S>,
    virtual_uri: &Url,
    action: CodeAction,
) -> Option<CodeAction> {
    let edit = match action.edit {
        Some(edit) => Some(edits.translate_workspace_edit(edit)?),
        None => None,
    };
    let diagnostics = action.diagnostics.map(|diagnostics| {
        diagnostics
            .into_iter()
            .filter_map(|diagnostic| results.diagnostic(virtual_uri, diagnostic))
            .collect()
    });
    Some(CodeAction {
        edit,
        diagnostics,
        data: wrap_data(virtual_uri, action.data),
        ..action
    })
}
