//! A scripted engine that records every call it receives.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use mosaic_ls::document::Document;
use mosaic_ls::{EngineError, EngineResult, LanguageEngine};
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{
    CallHierarchyIncomingCall, CallHierarchyItem, CallHierarchyOutgoingCall, CodeAction,
    CodeActionContext, CompletionItem, Diagnostic, DocumentSymbol, FoldingRange,
    FormattingOptions, Hover, HoverContents, Location, MarkedString, Position, Range,
    SelectionRange, SemanticToken, SymbolInformation, TextEdit, WorkspaceEdit,
};
use url::Url;

/// One engine invocation as observed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub feature: &'static str,
    pub uri: Url,
    pub version: String,
    pub text: String,
    pub position: Option<Position>,
}

/// Engine whose answers are configured per virtual document URI.
///
/// Unconfigured features answer empty. Answers are returned verbatim, so they
/// must be written in virtual-document coordinates.
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<Call>>,
    completion_directories: Mutex<Vec<PathBuf>>,
    hierarchy_requests: Mutex<Vec<CallHierarchyItem>>,
    rejected: Vec<Url>,
    failing: Vec<&'static str>,
    cancel_on_first_call: Option<CancellationToken>,
    hovers: HashMap<Url, Hover>,
    completions: HashMap<Url, Vec<CompletionItem>>,
    definitions: HashMap<Url, Vec<Location>>,
    references: HashMap<Url, Vec<Location>>,
    prepare_renames: HashMap<Url, Range>,
    renames: HashMap<Url, WorkspaceEdit>,
    file_rename: Option<WorkspaceEdit>,
    diagnostics: HashMap<Url, Vec<Diagnostic>>,
    code_actions: HashMap<Url, Vec<CodeAction>>,
    symbols: HashMap<Url, Vec<DocumentSymbol>>,
    workspace_symbols: Vec<SymbolInformation>,
    formatting: HashMap<Url, Vec<TextEdit>>,
    selection_ranges: HashMap<Url, SelectionRange>,
    folding_ranges: HashMap<Url, Vec<FoldingRange>>,
    semantic_tokens: HashMap<Url, Vec<SemanticToken>>,
    call_hierarchy: HashMap<Url, Vec<CallHierarchyItem>>,
    incoming_calls: HashMap<String, Vec<CallHierarchyIncomingCall>>,
    outgoing_calls: HashMap<String, Vec<CallHierarchyOutgoingCall>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine's program does not contain `uri`.
    pub fn rejecting(mut self, uri: Url) -> Self {
        self.rejected.push(uri);
        self
    }

    /// Every call of `feature` returns an error.
    pub fn failing(mut self, feature: &'static str) -> Self {
        self.failing.push(feature);
        self
    }

    /// Cancel `token` while serving the first call.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_first_call = Some(token);
        self
    }

    pub fn with_hover(mut self, uri: Url, text: &str, range: Option<Range>) -> Self {
        self.hovers.insert(
            uri,
            Hover {
                contents: HoverContents::Scalar(MarkedString::String(text.to_string())),
                range,
            },
        );
        self
    }

    pub fn with_completions(mut self, uri: Url, items: Vec<CompletionItem>) -> Self {
        self.completions.insert(uri, items);
        self
    }

    pub fn with_definitions(mut self, uri: Url, locations: Vec<Location>) -> Self {
        self.definitions.insert(uri, locations);
        self
    }

    pub fn with_references(mut self, uri: Url, locations: Vec<Location>) -> Self {
        self.references.insert(uri, locations);
        self
    }

    pub fn with_prepare_rename(mut self, uri: Url, range: Range) -> Self {
        self.prepare_renames.insert(uri, range);
        self
    }

    pub fn with_rename(mut self, uri: Url, edit: WorkspaceEdit) -> Self {
        self.renames.insert(uri, edit);
        self
    }

    pub fn with_file_rename(mut self, edit: WorkspaceEdit) -> Self {
        self.file_rename = Some(edit);
        self
    }

    pub fn with_diagnostics(mut self, uri: Url, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics.insert(uri, diagnostics);
        self
    }

    pub fn with_code_actions(mut self, uri: Url, actions: Vec<CodeAction>) -> Self {
        self.code_actions.insert(uri, actions);
        self
    }

    pub fn with_symbols(mut self, uri: Url, symbols: Vec<DocumentSymbol>) -> Self {
        self.symbols.insert(uri, symbols);
        self
    }

    pub fn with_workspace_symbols(mut self, symbols: Vec<SymbolInformation>) -> Self {
        self.workspace_symbols = symbols;
        self
    }

    pub fn with_formatting(mut self, uri: Url, edits: Vec<TextEdit>) -> Self {
        self.formatting.insert(uri, edits);
        self
    }

    pub fn with_selection_range(mut self, uri: Url, selection: SelectionRange) -> Self {
        self.selection_ranges.insert(uri, selection);
        self
    }

    pub fn with_folding_ranges(mut self, uri: Url, folds: Vec<FoldingRange>) -> Self {
        self.folding_ranges.insert(uri, folds);
        self
    }

    /// Tokens in the protocol's relative encoding.
    pub fn with_semantic_tokens(mut self, uri: Url, tokens: Vec<SemanticToken>) -> Self {
        self.semantic_tokens.insert(uri, tokens);
        self
    }

    pub fn with_call_hierarchy(mut self, uri: Url, items: Vec<CallHierarchyItem>) -> Self {
        self.call_hierarchy.insert(uri, items);
        self
    }

    /// Callers of the item called `name`.
    pub fn with_incoming_calls(mut self, name: &str, calls: Vec<CallHierarchyIncomingCall>) -> Self {
        self.incoming_calls.insert(name.to_string(), calls);
        self
    }

    /// Callees of the item called `name`.
    pub fn with_outgoing_calls(mut self, name: &str, calls: Vec<CallHierarchyOutgoingCall>) -> Self {
        self.outgoing_calls.insert(name.to_string(), calls);
        self
    }

    /// Current directories completion requests were made with.
    pub fn completion_directories(&self) -> Vec<PathBuf> {
        self.completion_directories.lock().expect("directories lock").clone()
    }

    /// Items incoming and outgoing call requests were made for, as the
    /// engine received them.
    pub fn hierarchy_requests(&self) -> Vec<CallHierarchyItem> {
        self.hierarchy_requests.lock().expect("requests lock").clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_for(&self, feature: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.feature == feature)
            .collect()
    }

    fn record(
        &self,
        feature: &'static str,
        document: &Document,
        position: Option<Position>,
    ) -> EngineResult<()> {
        let mut calls = self.calls.lock().expect("calls lock");
        calls.push(Call {
            feature,
            uri: document.uri().clone(),
            version: document.version().to_string(),
            text: document.text().to_string(),
            position,
        });
        if calls.len() == 1
            && let Some(token) = &self.cancel_on_first_call
        {
            token.cancel();
        }
        if self.failing.contains(&feature) {
            return Err(EngineError::new(format!("{} is broken", feature)));
        }
        Ok(())
    }
}

impl LanguageEngine for RecordingEngine {
    fn has_analyzable_unit(&self, uri: &Url) -> bool {
        !self.rejected.contains(uri)
    }

    fn hover(&self, document: &Document, position: Position) -> EngineResult<Option<Hover>> {
        self.record("hover", document, Some(position))?;
        Ok(self.hovers.get(document.uri()).cloned())
    }

    fn completion(
        &self,
        document: &Document,
        position: Position,
        current_directory: &Path,
    ) -> EngineResult<Vec<CompletionItem>> {
        self.record("completion", document, Some(position))?;
        self.completion_directories
            .lock()
            .expect("directories lock")
            .push(current_directory.to_path_buf());
        Ok(self
            .completions
            .get(document.uri())
            .cloned()
            .unwrap_or_default())
    }

    fn resolve_completion(
        &self,
        document: &Document,
        item: CompletionItem,
    ) -> EngineResult<CompletionItem> {
        self.record("completionItem/resolve", document, None)?;
        Ok(CompletionItem {
            detail: Some(format!("resolved with {:?}", item.data)),
            ..item
        })
    }

    fn definition(&self, document: &Document, position: Position) -> EngineResult<Vec<Location>> {
        self.record("definition", document, Some(position))?;
        Ok(self
            .definitions
            .get(document.uri())
            .cloned()
            .unwrap_or_default())
    }

    fn references(
        &self,
        document: &Document,
        position: Position,
        _include_declaration: bool,
    ) -> EngineResult<Vec<Location>> {
        self.record("references", document, Some(position))?;
        Ok(self
            .references
            .get(document.uri())
            .cloned()
            .unwrap_or_default())
    }

    fn prepare_rename(&self, document: &Document, position: Position) -> EngineResult<Option<Range>> {
        self.record("prepareRename", document, Some(position))?;
        Ok(self.prepare_renames.get(document.uri()).copied())
    }

    fn rename(
        &self,
        document: &Document,
        position: Position,
        _new_name: &str,
    ) -> EngineResult<Option<WorkspaceEdit>> {
        self.record("rename", document, Some(position))?;
        Ok(self.renames.get(document.uri()).cloned())
    }

    fn file_rename_edits(&self, _old: &Url, _new: &Url) -> EngineResult<Option<WorkspaceEdit>> {
        Ok(self.file_rename.clone())
    }

    fn diagnostics(&self, document: &Document) -> EngineResult<Vec<Diagnostic>> {
        self.record("diagnostics", document, None)?;
        Ok(self
            .diagnostics
            .get(document.uri())
            .cloned()
            .unwrap_or_default())
    }

    fn code_actions(
        &self,
        document: &Document,
        range: Range,
        _context: &CodeActionContext,
    ) -> EngineResult<Vec<CodeAction>> {
        self.record("codeAction", document, Some(range.start))?;
        Ok(self
            .code_actions
            .get(document.uri())
            .cloned()
            .unwrap_or_default())
    }

    fn document_symbols(&self, document: &Document) -> EngineResult<Vec<DocumentSymbol>> {
        self.record("documentSymbol", document, None)?;
        Ok(self.symbols.get(document.uri()).cloned().unwrap_or_default())
    }

    fn workspace_symbols(&self, _query: &str) -> EngineResult<Vec<SymbolInformation>> {
        Ok(self.workspace_symbols.clone())
    }

    fn formatting(
        &self,
        document: &Document,
        _options: &FormattingOptions,
    ) -> EngineResult<Vec<TextEdit>> {
        self.record("formatting", document, None)?;
        Ok(self
            .formatting
            .get(document.uri())
            .cloned()
            .unwrap_or_default())
    }

    fn selection_ranges(
        &self,
        document: &Document,
        positions: &[Position],
    ) -> EngineResult<Vec<SelectionRange>> {
        self.record("selectionRange", document, positions.first().copied())?;
        Ok(self
            .selection_ranges
            .get(document.uri())
            .cloned()
            .into_iter()
            .collect())
    }

    fn folding_ranges(&self, document: &Document) -> EngineResult<Vec<FoldingRange>> {
        self.record("foldingRange", document, None)?;
        Ok(self
            .folding_ranges
            .get(document.uri())
            .cloned()
            .unwrap_or_default())
    }

    fn semantic_tokens(&self, document: &Document) -> EngineResult<Vec<SemanticToken>> {
        self.record("semanticTokens", document, None)?;
        Ok(self
            .semantic_tokens
            .get(document.uri())
            .cloned()
            .unwrap_or_default())
    }

    fn prepare_call_hierarchy(
        &self,
        document: &Document,
        position: Position,
    ) -> EngineResult<Vec<CallHierarchyItem>> {
        self.record("prepareCallHierarchy", document, Some(position))?;
        Ok(self
            .call_hierarchy
            .get(document.uri())
            .cloned()
            .unwrap_or_default())
    }

    fn incoming_calls(
        &self,
        item: &CallHierarchyItem,
    ) -> EngineResult<Vec<CallHierarchyIncomingCall>> {
        self.hierarchy_requests
            .lock()
            .expect("requests lock")
            .push(item.clone());
        Ok(self.incoming_calls.get(&item.name).cloned().unwrap_or_default())
    }

    fn outgoing_calls(
        &self,
        item: &CallHierarchyItem,
    ) -> EngineResult<Vec<CallHierarchyOutgoingCall>> {
        self.hierarchy_requests
            .lock()
            .expect("requests lock")
            .push(item.clone());
        Ok(self.outgoing_calls.get(&item.name).cloned().unwrap_or_default())
    }
}
