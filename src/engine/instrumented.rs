use std::path::Path;
use std::time::Instant;

use log::{debug, warn};
use tower_lsp_server::ls_types::{
    CallHierarchyIncomingCall, CallHierarchyItem, CallHierarchyOutgoingCall, CodeAction,
    CodeActionContext, CompletionItem, Diagnostic, DocumentHighlight, DocumentSymbol,
    FoldingRange, FormattingOptions, Hover, Location, Position, Range, SelectionRange,
    SemanticToken, SignatureHelp, SymbolInformation, TextEdit, WorkspaceEdit,
};
use url::Url;

use super::LanguageEngine;
use crate::document::Document;
use crate::error::EngineResult;

/// Wraps an engine with per-call timing and failure logging.
///
/// Constructed once by the service; the wrapped engine is otherwise untouched.
pub struct InstrumentedEngine<E> {
    inner: E,
}

impl<E: LanguageEngine> InstrumentedEngine<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    fn observe<T>(
        &self,
        feature: &'static str,
        subject: &dyn std::fmt::Display,
        call: impl FnOnce(&E) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let started = Instant::now();
        let result = call(&self.inner);
        let elapsed = started.elapsed();
        match &result {
            Ok(_) => debug!(
                target: "mosaic::engine",
                "{} {} took {:?}",
                feature,
                subject,
                elapsed
            ),
            Err(e) => warn!(
                target: "mosaic::engine",
                "{} {} failed after {:?}: {}",
                feature,
                subject,
                elapsed,
                e
            ),
        }
        result
    }
}

impl<E: LanguageEngine> LanguageEngine for InstrumentedEngine<E> {
    fn has_analyzable_unit(&self, uri: &Url) -> bool {
        self.inner.has_analyzable_unit(uri)
    }

    fn hover(&self, document: &Document, position: Position) -> EngineResult<Option<Hover>> {
        self.observe("hover", document.uri(), |e| e.hover(document, position))
    }

    fn completion(
        &self,
        document: &Document,
        position: Position,
        current_directory: &Path,
    ) -> EngineResult<Vec<CompletionItem>> {
        self.observe("completion", document.uri(), |e| {
            e.completion(document, position, current_directory)
        })
    }

    fn resolve_completion(
        &self,
        document: &Document,
        item: CompletionItem,
    ) -> EngineResult<CompletionItem> {
        self.observe("completionItem/resolve", document.uri(), |e| {
            e.resolve_completion(document, item)
        })
    }

    fn definition(&self, document: &Document, position: Position) -> EngineResult<Vec<Location>> {
        self.observe("definition", document.uri(), |e| {
            e.definition(document, position)
        })
    }

    fn type_definition(
        &self,
        document: &Document,
        position: Position,
    ) -> EngineResult<Vec<Location>> {
        self.observe("typeDefinition", document.uri(), |e| {
            e.type_definition(document, position)
        })
    }

    fn references(
        &self,
        document: &Document,
        position: Position,
        include_declaration: bool,
    ) -> EngineResult<Vec<Location>> {
        self.observe("references", document.uri(), |e| {
            e.references(document, position, include_declaration)
        })
    }

    fn document_highlights(
        &self,
        document: &Document,
        position: Position,
    ) -> EngineResult<Vec<DocumentHighlight>> {
        self.observe("documentHighlight", document.uri(), |e| {
            e.document_highlights(document, position)
        })
    }

    fn prepare_rename(&self, document: &Document, position: Position) -> EngineResult<Option<Range>> {
        self.observe("prepareRename", document.uri(), |e| {
            e.prepare_rename(document, position)
        })
    }

    fn rename(
        &self,
        document: &Document,
        position: Position,
        new_name: &str,
    ) -> EngineResult<Option<WorkspaceEdit>> {
        self.observe("rename", document.uri(), |e| {
            e.rename(document, position, new_name)
        })
    }

    fn file_rename_edits(&self, old: &Url, new: &Url) -> EngineResult<Option<WorkspaceEdit>> {
        self.observe("fileRename", old, |e| e.file_rename_edits(old, new))
    }

    fn diagnostics(&self, document: &Document) -> EngineResult<Vec<Diagnostic>> {
        self.observe("diagnostics", document.uri(), |e| e.diagnostics(document))
    }

    fn code_actions(
        &self,
        document: &Document,
        range: Range,
        context: &CodeActionContext,
    ) -> EngineResult<Vec<CodeAction>> {
        self.observe("codeAction", document.uri(), |e| {
            e.code_actions(document, range, context)
        })
    }

    fn resolve_code_action(
        &self,
        document: &Document,
        action: CodeAction,
    ) -> EngineResult<CodeAction> {
        self.observe("codeAction/resolve", document.uri(), |e| {
            e.resolve_code_action(document, action)
        })
    }

    fn document_symbols(&self, document: &Document) -> EngineResult<Vec<DocumentSymbol>> {
        self.observe("documentSymbol", document.uri(), |e| {
            e.document_symbols(document)
        })
    }

    fn workspace_symbols(&self, query: &str) -> EngineResult<Vec<SymbolInformation>> {
        self.observe("workspaceSymbol", &query, |e| e.workspace_symbols(query))
    }

    fn formatting(
        &self,
        document: &Document,
        options: &FormattingOptions,
    ) -> EngineResult<Vec<TextEdit>> {
        self.observe("formatting", document.uri(), |e| {
            e.formatting(document, options)
        })
    }

    fn signature_help(
        &self,
        document: &Document,
        position: Position,
    ) -> EngineResult<Option<SignatureHelp>> {
        self.observe("signatureHelp", document.uri(), |e| {
            e.signature_help(document, position)
        })
    }

    fn selection_ranges(
        &self,
        document: &Document,
        positions: &[Position],
    ) -> EngineResult<Vec<SelectionRange>> {
        self.observe("selectionRange", document.uri(), |e| {
            e.selection_ranges(document, positions)
        })
    }

    fn folding_ranges(&self, document: &Document) -> EngineResult<Vec<FoldingRange>> {
        self.observe("foldingRange", document.uri(), |e| e.folding_ranges(document))
    }

    fn semantic_tokens(&self, document: &Document) -> EngineResult<Vec<SemanticToken>> {
        self.observe("semanticTokens", document.uri(), |e| e.semantic_tokens(document))
    }

    fn prepare_call_hierarchy(
        &self,
        document: &Document,
        position: Position,
    ) -> EngineResult<Vec<CallHierarchyItem>> {
        self.observe("prepareCallHierarchy", document.uri(), |e| {
            e.prepare_call_hierarchy(document, position)
        })
    }

    fn incoming_calls(
        &self,
        item: &CallHierarchyItem,
    ) -> EngineResult<Vec<CallHierarchyIncomingCall>> {
        self.observe("callHierarchy/incomingCalls", &item.name, |e| e.incoming_calls(item))
    }

    fn outgoing_calls(
        &self,
        item: &CallHierarchyItem,
    ) -> EngineResult<Vec<CallHierarchyOutgoingCall>> {
        self.observe("callHierarchy/outgoingCalls", &item.name, |e| e.outgoing_calls(item))
    }
}
