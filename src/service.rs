//! Composition root: one language service per workspace.

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{debug, info};
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{
    CallHierarchyIncomingCall, CallHierarchyItem, CallHierarchyOutgoingCall, CodeAction,
    CodeActionContext, CompletionItem, Diagnostic, DocumentHighlight, DocumentSymbol,
    FoldingRange, FormattingOptions, Hover, Location, Position, Range, SelectionRange,
    SemanticTokens, SignatureHelp, SymbolInformation, TextEdit, WorkspaceEdit,
};
use url::Url;

use crate::config::MosaicSettings;
use crate::dispatch::{DispatchSource, FeatureDispatcher};
use crate::document::{Document, DocumentCache, DocumentStore, HostEnvironment};
use crate::embedding::{Extraction, Extractor, RegionRegistry, VirtualDocument};
use crate::engine::{InstrumentedEngine, LanguageEngine};
use crate::error::FeatureResult;
use crate::mapping::MappingSource;

/// Owns the snapshot cache, the region registry and the engine, and exposes
/// one method per language feature in host coordinates.
///
/// State is synchronized lazily: every request re-validates the host version,
/// re-extracts regions when the host changed, and evicts virtual snapshots
/// that the new extraction retired.
pub struct LanguageService<E, H = DocumentStore> {
    host: Arc<H>,
    extractor: Arc<dyn Extractor>,
    engine: InstrumentedEngine<E>,
    cache: DocumentCache,
    regions: RegionRegistry,
    settings: ArcSwap<MosaicSettings>,
}

impl<E: LanguageEngine, H: HostEnvironment> LanguageService<E, H> {
    pub fn new(host: Arc<H>, extractor: Arc<dyn Extractor>, engine: E) -> Self {
        Self {
            host,
            extractor,
            engine: InstrumentedEngine::new(engine),
            cache: DocumentCache::new(),
            regions: RegionRegistry::new(),
            settings: ArcSwap::from_pointee(MosaicSettings::default()),
        }
    }

    pub fn with_settings(self, settings: MosaicSettings) -> Self {
        self.settings.store(Arc::new(settings));
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn engine(&self) -> &E {
        self.engine.inner()
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub fn regions(&self) -> &RegionRegistry {
        &self.regions
    }

    pub fn settings(&self) -> Arc<MosaicSettings> {
        self.settings.load_full()
    }

    /// Replace the settings. Every host is re-extracted on its next request
    /// so capability restrictions take effect immediately.
    pub fn apply_settings(&self, settings: MosaicSettings) {
        self.settings.store(Arc::new(settings));
        self.regions.invalidate_all();
        info!(target: "mosaic::config", "settings applied; extractions invalidated");
    }

    /// Re-extract `host_uri` after the editor opened or changed it, so its
    /// virtual documents are known before the first request names them.
    ///
    /// Returns false when the host environment does not track `host_uri`.
    pub fn refresh(&self, host_uri: &Url) -> bool {
        self.synced_extraction(host_uri).is_some()
    }

    /// Drop everything known about `host_uri` (the editor closed it).
    pub fn evict(&self, host_uri: &Url) {
        self.cache.evict(host_uri);
        for virtual_uri in self.regions.remove(host_uri) {
            self.cache.evict(&virtual_uri);
        }
    }

    fn dispatcher(&self) -> FeatureDispatcher<'_, Self, InstrumentedEngine<E>> {
        FeatureDispatcher::new(self, &self.engine)
    }

    /// Current extraction of a host document, re-extracted if the host moved on.
    fn synced_extraction(&self, host_uri: &Url) -> Option<Arc<Extraction>> {
        if self.regions.host_of(host_uri).is_some() {
            return None;
        }
        let Some(host) = self.cache.get_document(host_uri, self.host.as_ref()) else {
            let retired = self.regions.remove(host_uri);
            if !retired.is_empty() {
                debug!(target: "mosaic::regions", "{} is no longer tracked", host_uri);
            }
            for uri in retired {
                self.cache.evict(&uri);
            }
            return None;
        };

        let settings = self.settings.load();
        let outcome = self.regions.sync(&host, self.extractor.as_ref(), &settings);
        for uri in &outcome.retired {
            self.cache.evict(uri);
        }
        Some(outcome.extraction)
    }

    pub fn hover(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<Hover>> {
        self.dispatcher().hover(uri, position, cancel)
    }

    pub fn completion(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CompletionItem>> {
        self.dispatcher().completion(uri, position, cancel)
    }

    pub fn resolve_completion(
        &self,
        item: CompletionItem,
        cancel: &CancellationToken,
    ) -> FeatureResult<CompletionItem> {
        self.dispatcher().resolve_completion(item, cancel)
    }

    pub fn definition(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<Location>> {
        self.dispatcher().definition(uri, position, cancel)
    }

    pub fn type_definition(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<Location>> {
        self.dispatcher().type_definition(uri, position, cancel)
    }

    pub fn references(
        &self,
        uri: &Url,
        position: Position,
        include_declaration: bool,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<Location>> {
        self.dispatcher()
            .references(uri, position, include_declaration, cancel)
    }

    pub fn document_highlights(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<DocumentHighlight>> {
        self.dispatcher().document_highlights(uri, position, cancel)
    }

    pub fn prepare_rename(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<Range>> {
        self.dispatcher().prepare_rename(uri, position, cancel)
    }

    pub fn rename(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<WorkspaceEdit>> {
        self.dispatcher().rename(uri, position, new_name, cancel)
    }

    pub fn file_rename_edits(
        &self,
        old: &Url,
        new: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<WorkspaceEdit>> {
        self.dispatcher().file_rename_edits(old, new, cancel)
    }

    pub fn diagnostics(
        &self,
        uri: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<Diagnostic>> {
        self.dispatcher().diagnostics(uri, cancel)
    }

    pub fn code_actions(
        &self,
        uri: &Url,
        range: Range,
        context: &CodeActionContext,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CodeAction>> {
        self.dispatcher().code_actions(uri, range, context, cancel)
    }

    pub fn resolve_code_action(
        &self,
        action: CodeAction,
        cancel: &CancellationToken,
    ) -> FeatureResult<CodeAction> {
        self.dispatcher().resolve_code_action(action, cancel)
    }

    pub fn document_symbols(
        &self,
        uri: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<DocumentSymbol>> {
        self.dispatcher().document_symbols(uri, cancel)
    }

    pub fn workspace_symbols(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<SymbolInformation>> {
        self.dispatcher().workspace_symbols(query, cancel)
    }

    pub fn formatting(
        &self,
        uri: &Url,
        options: &FormattingOptions,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<TextEdit>> {
        self.dispatcher().formatting(uri, options, cancel)
    }

    pub fn signature_help(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<SignatureHelp>> {
        self.dispatcher().signature_help(uri, position, cancel)
    }

    pub fn selection_ranges(
        &self,
        uri: &Url,
        positions: &[Position],
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<SelectionRange>> {
        self.dispatcher().selection_ranges(uri, positions, cancel)
    }

    pub fn folding_ranges(
        &self,
        uri: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<FoldingRange>> {
        self.dispatcher().folding_ranges(uri, cancel)
    }

    pub fn semantic_tokens(
        &self,
        uri: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<SemanticTokens> {
        self.dispatcher().semantic_tokens(uri, cancel)
    }

    pub fn prepare_call_hierarchy(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CallHierarchyItem>> {
        self.dispatcher().prepare_call_hierarchy(uri, position, cancel)
    }

    pub fn incoming_calls(
        &self,
        item: CallHierarchyItem,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CallHierarchyIncomingCall>> {
        self.dispatcher().incoming_calls(item, cancel)
    }

    pub fn outgoing_calls(
        &self,
        item: CallHierarchyItem,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CallHierarchyOutgoingCall>> {
        self.dispatcher().outgoing_calls(item, cancel)
    }
}

impl<E: LanguageEngine, H: HostEnvironment> MappingSource for LanguageService<E, H> {
    fn extraction(&self, host_uri: &Url) -> Option<Arc<Extraction>> {
        self.synced_extraction(host_uri)
    }

    fn virtual_document(
        &self,
        virtual_uri: &Url,
    ) -> Option<(Arc<Extraction>, Arc<VirtualDocument>)> {
        let host_uri = self.regions.host_of(virtual_uri)?;
        let extraction = self.synced_extraction(&host_uri)?;
        let document = Arc::clone(extraction.document(virtual_uri)?);
        Some((extraction, document))
    }

    fn is_tracked(&self, uri: &Url) -> bool {
        self.host.script_version(uri).is_some()
    }
}

impl<E: LanguageEngine, H: HostEnvironment> DispatchSource for LanguageService<E, H> {
    fn valid_document(&self, uri: &Url) -> Option<Arc<Document>> {
        let membership = |uri: &Url| self.engine.has_analyzable_unit(uri);
        match self.virtual_document(uri) {
            Some((extraction, _)) => self.cache.get_valid_document(uri, extraction.as_ref(), membership),
            None if self.regions.host_of(uri).is_some() => None,
            None => self.cache.get_valid_document(uri, self.host.as_ref(), membership),
        }
    }

    fn current_directory(&self) -> PathBuf {
        self.host.current_directory()
    }
}
