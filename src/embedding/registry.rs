//! Extraction state per host document.
//!
//! An [`Extraction`] is the immutable result of running the extractor over one
//! host snapshot: the virtual documents, their validated mappings and an
//! interval index over host spans. The [`RegionRegistry`] keeps the current
//! extraction of every host and rebuilds it only when the host snapshot
//! changes, so repeated queries against one host version see identical
//! documents and capability sets.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, warn};
use rust_lapper::{Interval, Lapper};
use url::Url;

use super::{ExtractedRegion, Extractor, MappingMode, SourceMapping, virtual_document_uri};
use crate::config::MosaicSettings;
use crate::document::{Document, Snapshot, SnapshotProvider, VersionToken};
use crate::text::{PositionMapper, Span, compute_line_starts, fingerprint};

/// Synthetic standalone document presenting one embedded region to the engine.
#[derive(Debug)]
pub struct VirtualDocument {
    uri: Url,
    host_uri: Url,
    region_id: String,
    language_id: String,
    version: VersionToken,
    text: String,
    mappings: Vec<SourceMapping>,
    declaration_index: usize,
    line_starts: Vec<usize>,
}

impl VirtualDocument {
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn host_uri(&self) -> &Url {
        &self.host_uri
    }

    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// `"{host version}#{text fingerprint}"`.
    pub fn version(&self) -> &VersionToken {
        &self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mappings(&self) -> &[SourceMapping] {
        &self.mappings
    }

    /// Position of this document in the extractor's output.
    pub fn declaration_index(&self) -> usize {
        self.declaration_index
    }

    pub fn position_mapper(&self) -> PositionMapper<'_> {
        PositionMapper::with_line_starts(&self.text, &self.line_starts)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.version.clone(),
            self.language_id.clone(),
            self.text.clone(),
        )
    }
}

/// Index of a mapping: (virtual document, mapping) positions.
type MappingKey = (usize, usize);

/// Virtual documents of one host snapshot.
pub struct Extraction {
    host: Arc<Document>,
    generation: u64,
    documents: Vec<Arc<VirtualDocument>>,
    host_index: Lapper<usize, MappingKey>,
}

impl Extraction {
    /// Validate extractor output against `host` and build the host index.
    ///
    /// Invalid mappings are dropped with a warning; a region whose id repeats
    /// an earlier one is skipped entirely. Capabilities are narrowed by the
    /// language settings.
    pub fn new(
        host: Arc<Document>,
        regions: Vec<ExtractedRegion>,
        settings: &MosaicSettings,
        generation: u64,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut documents = Vec::with_capacity(regions.len());

        for region in regions {
            if region.region_id.is_empty() || !seen.insert(region.region_id.clone()) {
                warn!(
                    target: "mosaic::regions",
                    "skipping region with empty or duplicate id '{}' in {}",
                    region.region_id,
                    host.uri()
                );
                continue;
            }

            let mappings = region
                .mappings
                .into_iter()
                .filter(|mapping| validate_mapping(host.text(), &region.text, mapping, &region.region_id))
                .map(|mut mapping| {
                    mapping.capabilities = settings
                        .effective_capabilities(&region.language_id, mapping.capabilities);
                    mapping
                })
                .collect();

            let version = VersionToken::new(format!(
                "{}#{}",
                host.version(),
                fingerprint(&region.text)
            ));
            let line_starts = compute_line_starts(&region.text);
            documents.push(Arc::new(VirtualDocument {
                uri: virtual_document_uri(host.uri(), &region.language_id, &region.region_id),
                host_uri: host.uri().clone(),
                declaration_index: documents.len(),
                region_id: region.region_id,
                language_id: region.language_id,
                version,
                text: region.text,
                mappings,
                line_starts,
            }));
        }

        // Intervals are widened by one byte so cursors on a closing boundary
        // and empty spans are found; callers filter precisely.
        let intervals = documents
            .iter()
            .enumerate()
            .flat_map(|(doc_index, doc)| {
                doc.mappings
                    .iter()
                    .enumerate()
                    .map(move |(mapping_index, mapping)| Interval {
                        start: mapping.host.start,
                        stop: mapping.host.end + 1,
                        val: (doc_index, mapping_index),
                    })
            })
            .collect();

        Self {
            host,
            generation,
            documents,
            host_index: Lapper::new(intervals),
        }
    }

    /// Host snapshot this extraction was built from.
    pub fn host(&self) -> &Arc<Document> {
        &self.host
    }

    pub fn documents(&self) -> &[Arc<VirtualDocument>] {
        &self.documents
    }

    pub fn document(&self, uri: &Url) -> Option<&Arc<VirtualDocument>> {
        self.documents.iter().find(|doc| doc.uri() == uri)
    }

    /// Mappings whose closed host span touches the closed query span, in
    /// host start order, then declaration order of document and mapping.
    pub fn mappings_near(&self, host: Span) -> Vec<(&Arc<VirtualDocument>, usize)> {
        let mut keys: Vec<(usize, MappingKey)> = self
            .host_index
            .find(host.start, host.end + 1)
            .map(|interval| (interval.start, interval.val))
            .collect();
        keys.sort_unstable();
        keys.into_iter()
            .map(|(_, (doc_index, mapping_index))| (&self.documents[doc_index], mapping_index))
            .collect()
    }
}

impl SnapshotProvider for Extraction {
    fn script_version(&self, uri: &Url) -> Option<VersionToken> {
        self.document(uri).map(|doc| doc.version().clone())
    }

    fn script_snapshot(&self, uri: &Url) -> Option<Snapshot> {
        self.document(uri).map(|doc| doc.snapshot())
    }
}

fn validate_mapping(
    host_text: &str,
    virtual_text: &str,
    mapping: &SourceMapping,
    region_id: &str,
) -> bool {
    let reject = |reason: &str| {
        warn!(
            target: "mosaic::regions",
            "dropping mapping {:?} -> {:?} of region '{}': {}",
            mapping.host,
            mapping.virtual_span,
            region_id,
            reason
        );
        false
    };

    if mapping.host.start > mapping.host.end || mapping.virtual_span.start > mapping.virtual_span.end {
        return reject("inverted span");
    }
    let (Some(host_slice), Some(virtual_slice)) = (
        mapping.host.slice(host_text),
        mapping.virtual_span.slice(virtual_text),
    ) else {
        return reject("out of bounds or not on a character boundary");
    };
    if mapping.mode == MappingMode::Offset && host_slice != virtual_slice {
        return reject("offset mapping is not content-preserving");
    }
    true
}

/// Outcome of [`RegionRegistry::sync`].
pub struct SyncOutcome {
    pub extraction: Arc<Extraction>,
    /// Virtual documents of the previous extraction that disappeared or
    /// changed content.
    pub retired: Vec<Url>,
}

/// Current extraction per host URI.
#[derive(Default)]
pub struct RegionRegistry {
    extractions: DashMap<Url, Arc<Extraction>>,
    virtual_to_host: DashMap<Url, Url>,
    generation: AtomicU64,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the extraction for `host`, rebuilding it if it was built from a
    /// different snapshot or before the last invalidation.
    pub fn sync(
        &self,
        host: &Arc<Document>,
        extractor: &dyn Extractor,
        settings: &MosaicSettings,
    ) -> SyncOutcome {
        let generation = self.generation.load(Ordering::Acquire);

        match self.extractions.entry(host.uri().clone()) {
            Entry::Occupied(mut entry) => {
                let current = entry.get();
                // A request holding an older snapshot never moves the entry back.
                let newest = if current.host().revision() > host.revision() {
                    debug!(
                        target: "mosaic::regions",
                        "{} @ revision {} is older than the registered extraction",
                        host.uri(),
                        host.revision().get()
                    );
                    Arc::clone(current.host())
                } else {
                    Arc::clone(host)
                };
                if Arc::ptr_eq(current.host(), &newest) && current.generation == generation {
                    return SyncOutcome {
                        extraction: Arc::clone(current),
                        retired: Vec::new(),
                    };
                }
                let next = Arc::new(self.extract(&newest, extractor, settings, generation));
                let retired = retired_documents(current, &next);
                for uri in &retired {
                    self.virtual_to_host.remove(uri);
                }
                self.register(&next);
                entry.insert(Arc::clone(&next));
                SyncOutcome {
                    extraction: next,
                    retired,
                }
            }
            Entry::Vacant(entry) => {
                let next = Arc::new(self.extract(host, extractor, settings, generation));
                self.register(&next);
                entry.insert(Arc::clone(&next));
                SyncOutcome {
                    extraction: next,
                    retired: Vec::new(),
                }
            }
        }
    }

    fn extract(
        &self,
        host: &Arc<Document>,
        extractor: &dyn Extractor,
        settings: &MosaicSettings,
        generation: u64,
    ) -> Extraction {
        let regions = extractor.extract(host);
        let extraction = Extraction::new(Arc::clone(host), regions, settings, generation);
        debug!(
            target: "mosaic::regions",
            "extracted {} region(s) from {} @ {} (revision {})",
            extraction.documents().len(),
            host.uri(),
            host.version(),
            host.revision().get()
        );
        extraction
    }

    fn register(&self, extraction: &Extraction) {
        for doc in extraction.documents() {
            self.virtual_to_host
                .insert(doc.uri().clone(), doc.host_uri().clone());
        }
    }

    /// Current extraction of `host_uri` without re-validating it.
    pub fn get(&self, host_uri: &Url) -> Option<Arc<Extraction>> {
        self.extractions.get(host_uri).map(|entry| Arc::clone(entry.value()))
    }

    /// Host URI owning a registered virtual document.
    pub fn host_of(&self, virtual_uri: &Url) -> Option<Url> {
        self.virtual_to_host
            .get(virtual_uri)
            .map(|entry| entry.value().clone())
    }

    /// Forget `host_uri`; returns the virtual URIs it owned.
    pub fn remove(&self, host_uri: &Url) -> Vec<Url> {
        let Some((_, extraction)) = self.extractions.remove(host_uri) else {
            return Vec::new();
        };
        extraction
            .documents()
            .iter()
            .map(|doc| {
                self.virtual_to_host.remove(doc.uri());
                doc.uri().clone()
            })
            .collect()
    }

    /// Force every host to be re-extracted on its next sync.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn len(&self) -> usize {
        self.extractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractions.is_empty()
    }
}

fn retired_documents(previous: &Extraction, next: &Extraction) -> Vec<Url> {
    previous
        .documents()
        .iter()
        .filter(|old| {
            next.document(old.uri())
                .is_none_or(|new| new.version() != old.version())
        })
        .map(|old| old.uri().clone())
        .collect()
}
