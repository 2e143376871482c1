//! Shared fixtures for mapping and edit tests.

use std::sync::Arc;

use url::Url;

use super::MappingSource;
use crate::config::MosaicSettings;
use crate::document::{Document, Revision, Snapshot};
use crate::embedding::{
    ExtractedRegion, Extraction, SourceMapping, VirtualDocument,
};

/// A mapping source holding exactly one host document.
pub(crate) struct SingleHost {
    extraction: Arc<Extraction>,
    tracked: Vec<Url>,
}

impl SingleHost {
    pub(crate) fn new(text: &str, regions: Vec<ExtractedRegion>) -> Self {
        let host = Arc::new(Document::from_snapshot(
            host_uri(),
            Snapshot::new(1, "vue", text),
            Revision::INITIAL,
        ));
        Self {
            extraction: Arc::new(Extraction::new(
                host,
                regions,
                &MosaicSettings::default(),
                0,
            )),
            tracked: Vec::new(),
        }
    }

    /// Mark an additional non-virtual URI as tracked.
    pub(crate) fn with_tracked(mut self, uri: Url) -> Self {
        self.tracked.push(uri);
        self
    }

    pub(crate) fn host_uri(&self) -> &Url {
        self.extraction.host().uri()
    }

    pub(crate) fn virtual_uri(&self, region_id: &str) -> Url {
        let document = self
            .extraction
            .documents()
            .iter()
            .find(|doc| doc.region_id() == region_id)
            .expect("region registered in fixture");
        document.uri().clone()
    }
}

impl MappingSource for SingleHost {
    fn extraction(&self, host_uri: &Url) -> Option<Arc<Extraction>> {
        (host_uri == self.host_uri()).then(|| Arc::clone(&self.extraction))
    }

    fn virtual_document(
        &self,
        virtual_uri: &Url,
    ) -> Option<(Arc<Extraction>, Arc<VirtualDocument>)> {
        let document = self.extraction.document(virtual_uri)?;
        Some((Arc::clone(&self.extraction), Arc::clone(document)))
    }

    fn is_tracked(&self, uri: &Url) -> bool {
        uri == self.host_uri() || self.tracked.contains(uri)
    }
}

pub(crate) fn host_uri() -> Url {
    Url::parse("file:///project/App.vue").expect("valid fixture uri")
}

/// A TypeScript region.
pub(crate) fn region(id: &str, text: &str, mappings: Vec<SourceMapping>) -> ExtractedRegion {
    ExtractedRegion {
        region_id: id.to_string(),
        language_id: "typescript".to_string(),
        text: text.to_string(),
        mappings,
    }
}
