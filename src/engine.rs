//! The single-language analysis engine seam.
//!
//! The engine only ever sees standalone virtual documents; every coordinate it
//! receives or returns is in virtual-document space. All feature methods have
//! empty defaults so adapters implement the subset their engine supports.

mod instrumented;

pub use instrumented::InstrumentedEngine;

use std::path::Path;

use tower_lsp_server::ls_types::{
    CallHierarchyIncomingCall, CallHierarchyItem, CallHierarchyOutgoingCall, CodeAction,
    CodeActionContext, CompletionItem, Diagnostic, DocumentHighlight, DocumentSymbol,
    FoldingRange, FormattingOptions, Hover, Location, Position, Range, SelectionRange,
    SemanticToken, SignatureHelp, SymbolInformation, TextEdit, WorkspaceEdit,
};
use url::Url;

use crate::document::Document;
use crate::error::EngineResult;

/// Behaviour required from a concrete analysis engine binding.
///
/// Every document argument is the cache snapshot the request was resolved
/// against, so version and text always agree with the coordinates passed in.
pub trait LanguageEngine: Send + Sync {
    /// Whether the engine's program contains `uri` as an analyzable unit.
    fn has_analyzable_unit(&self, uri: &Url) -> bool;

    fn hover(&self, _document: &Document, _position: Position) -> EngineResult<Option<Hover>> {
        Ok(None)
    }

    /// Completions at `position`. Module specifiers in the items are written
    /// relative to `current_directory`.
    fn completion(
        &self,
        _document: &Document,
        _position: Position,
        _current_directory: &Path,
    ) -> EngineResult<Vec<CompletionItem>> {
        Ok(Vec::new())
    }

    /// Fill in lazily computed fields of a completion item.
    fn resolve_completion(
        &self,
        _document: &Document,
        item: CompletionItem,
    ) -> EngineResult<CompletionItem> {
        Ok(item)
    }

    fn definition(&self, _document: &Document, _position: Position) -> EngineResult<Vec<Location>> {
        Ok(Vec::new())
    }

    fn type_definition(
        &self,
        _document: &Document,
        _position: Position,
    ) -> EngineResult<Vec<Location>> {
        Ok(Vec::new())
    }

    fn references(
        &self,
        _document: &Document,
        _position: Position,
        _include_declaration: bool,
    ) -> EngineResult<Vec<Location>> {
        Ok(Vec::new())
    }

    fn document_highlights(
        &self,
        _document: &Document,
        _position: Position,
    ) -> EngineResult<Vec<DocumentHighlight>> {
        Ok(Vec::new())
    }

    /// Range of the symbol that would be renamed, if renaming is possible.
    fn prepare_rename(&self, _document: &Document, _position: Position) -> EngineResult<Option<Range>> {
        Ok(None)
    }

    fn rename(
        &self,
        _document: &Document,
        _position: Position,
        _new_name: &str,
    ) -> EngineResult<Option<WorkspaceEdit>> {
        Ok(None)
    }

    /// Edits updating references when a file moves from `old` to `new`.
    fn file_rename_edits(&self, _old: &Url, _new: &Url) -> EngineResult<Option<WorkspaceEdit>> {
        Ok(None)
    }

    fn diagnostics(&self, _document: &Document) -> EngineResult<Vec<Diagnostic>> {
        Ok(Vec::new())
    }

    fn code_actions(
        &self,
        _document: &Document,
        _range: Range,
        _context: &CodeActionContext,
    ) -> EngineResult<Vec<CodeAction>> {
        Ok(Vec::new())
    }

    fn resolve_code_action(
        &self,
        _document: &Document,
        action: CodeAction,
    ) -> EngineResult<CodeAction> {
        Ok(action)
    }

    fn document_symbols(&self, _document: &Document) -> EngineResult<Vec<DocumentSymbol>> {
        Ok(Vec::new())
    }

    fn workspace_symbols(&self, _query: &str) -> EngineResult<Vec<SymbolInformation>> {
        Ok(Vec::new())
    }

    fn formatting(
        &self,
        _document: &Document,
        _options: &FormattingOptions,
    ) -> EngineResult<Vec<TextEdit>> {
        Ok(Vec::new())
    }

    fn signature_help(
        &self,
        _document: &Document,
        _position: Position,
    ) -> EngineResult<Option<SignatureHelp>> {
        Ok(None)
    }

    /// One selection range chain per requested position.
    fn selection_ranges(
        &self,
        _document: &Document,
        _positions: &[Position],
    ) -> EngineResult<Vec<SelectionRange>> {
        Ok(Vec::new())
    }

    fn folding_ranges(&self, _document: &Document) -> EngineResult<Vec<FoldingRange>> {
        Ok(Vec::new())
    }

    /// Semantic tokens of the whole document in the protocol's relative
    /// encoding.
    fn semantic_tokens(&self, _document: &Document) -> EngineResult<Vec<SemanticToken>> {
        Ok(Vec::new())
    }

    fn prepare_call_hierarchy(
        &self,
        _document: &Document,
        _position: Position,
    ) -> EngineResult<Vec<CallHierarchyItem>> {
        Ok(Vec::new())
    }

    /// Callers of an item previously returned by
    /// [`prepare_call_hierarchy`](Self::prepare_call_hierarchy).
    fn incoming_calls(
        &self,
        _item: &CallHierarchyItem,
    ) -> EngineResult<Vec<CallHierarchyIncomingCall>> {
        Ok(Vec::new())
    }

    fn outgoing_calls(
        &self,
        _item: &CallHierarchyItem,
    ) -> EngineResult<Vec<CallHierarchyOutgoingCall>> {
        Ok(Vec::new())
    }
}
