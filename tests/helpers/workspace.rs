//! A language service over an in-memory document store.

use std::sync::Arc;

use mosaic_ls::document::DocumentStore;
use mosaic_ls::embedding::{ExtractedRegion, StaticExtractor, virtual_document_uri};
use mosaic_ls::{LanguageService, MosaicSettings};
use url::Url;

use super::engine::RecordingEngine;
use super::host_uri;

pub struct Workspace {
    pub store: Arc<DocumentStore>,
    pub extractor: Arc<StaticExtractor>,
    pub service: LanguageService<RecordingEngine>,
}

impl Workspace {
    pub fn new(engine: RecordingEngine) -> Self {
        Self::with_settings(engine, MosaicSettings::default())
    }

    pub fn with_settings(engine: RecordingEngine, settings: MosaicSettings) -> Self {
        let store = Arc::new(DocumentStore::with_current_directory("/project"));
        let extractor = Arc::new(StaticExtractor::new());
        let service = LanguageService::new(Arc::clone(&store), extractor.clone(), engine)
            .with_settings(settings);
        Self {
            store,
            extractor,
            service,
        }
    }

    /// Open the host document at version 1 with the given regions.
    pub fn open_host(&self, text: &str, regions: Vec<ExtractedRegion>) {
        self.extractor.set(host_uri(), regions);
        self.store.open(host_uri(), "vue", 1, text);
        assert!(self.service.refresh(&host_uri()));
    }

    /// Replace the host text and its regions.
    pub fn change_host(&self, version: i32, text: &str, regions: Vec<ExtractedRegion>) {
        self.extractor.set(host_uri(), regions);
        assert!(self.store.change(&host_uri(), version, text), "host is open");
        assert!(self.service.refresh(&host_uri()));
    }

    /// Open a plain file the host environment tracks.
    pub fn open_plain(&self, uri: &Url, text: &str) {
        self.store.open(uri.clone(), "typescript", 1, text);
    }

    pub fn engine(&self) -> &RecordingEngine {
        self.service.engine()
    }
}

/// URI of a TypeScript region of the default host.
pub fn virtual_uri(region_id: &str) -> Url {
    virtual_document_uri(&host_uri(), "typescript", region_id)
}
