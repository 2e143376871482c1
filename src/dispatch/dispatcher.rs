use std::sync::Arc;

use log::{debug, trace};
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::Range;
use url::Url;

use super::DispatchSource;
use crate::document::Document;
use crate::embedding::{Capability, VirtualDocument};
use crate::error::{EngineResult, FeatureResult, RequestCancelled};
use crate::mapping::{MappedRange, RangeMapper};

/// How many regions a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// Every region with the capability contributes.
    All,
    /// Regions are tried in region order until one yields a non-empty result.
    FirstNonEmpty,
}

/// Results that can be empty without being an error.
pub trait NonEmpty {
    fn is_non_empty(&self) -> bool;
}

impl<T> NonEmpty for Option<T> {
    fn is_non_empty(&self) -> bool {
        self.is_some()
    }
}

impl<T> NonEmpty for Vec<T> {
    fn is_non_empty(&self) -> bool {
        !self.is_empty()
    }
}

/// The result one region contributed to a request.
#[derive(Debug)]
pub struct Contribution<R> {
    pub region: MappedRange,
    pub value: R,
}

/// The result one virtual document contributed to a document-scoped request.
#[derive(Debug)]
pub struct DocumentContribution<R> {
    pub document: Arc<VirtualDocument>,
    pub value: R,
}

/// Generic request pipeline: map, filter by capability, call the engine per
/// virtual document, collect.
///
/// Holds no state across requests; construct one per request or share it.
pub struct FeatureDispatcher<'a, S: ?Sized, E: ?Sized> {
    source: &'a S,
    engine: &'a E,
}

impl<'a, S, E> FeatureDispatcher<'a, S, E>
where
    S: DispatchSource + ?Sized,
    E: crate::engine::LanguageEngine + ?Sized,
{
    pub fn new(source: &'a S, engine: &'a E) -> Self {
        Self { source, engine }
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn engine(&self) -> &'a E {
        self.engine
    }

    /// Run `call` for every region overlapping `range` of `host_uri` that
    /// grants `capability`.
    ///
    /// Engine errors count as empty contributions. Cancellation is checked
    /// before each engine call and once more after the last one; a cancelled
    /// request discards everything collected so far.
    pub fn dispatch<R, F>(
        &self,
        host_uri: &Url,
        range: Range,
        capability: Capability,
        fan_out: FanOut,
        cancel: &CancellationToken,
        mut call: F,
    ) -> FeatureResult<Vec<Contribution<R>>>
    where
        R: NonEmpty,
        F: FnMut(&E, &Document, &MappedRange) -> EngineResult<R>,
    {
        if self.source.valid_document(host_uri).is_none() {
            trace!(target: "mosaic::dispatch", "{} is not a valid document", host_uri);
            return Ok(Vec::new());
        }

        let regions = RangeMapper::new(self.source).to_virtual(host_uri, range);
        let mut contributions = Vec::new();
        for region in regions.into_iter().filter(|region| region.allows(capability)) {
            if cancel.is_cancelled() {
                return Err(RequestCancelled);
            }
            let Some(document) = self.current_document(&region.document) else {
                continue;
            };

            match call(self.engine, &document, &region) {
                Ok(value) if value.is_non_empty() => {
                    contributions.push(Contribution { region, value });
                    if fan_out == FanOut::FirstNonEmpty {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => debug!(
                    target: "mosaic::dispatch",
                    "{} request for {} failed: {}",
                    capability,
                    document.uri(),
                    e
                ),
            }
        }

        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }
        Ok(contributions)
    }

    /// Run `call` once per virtual document of `host_uri` that has at least one
    /// mapping granting `capability`.
    pub fn dispatch_documents<R, F>(
        &self,
        host_uri: &Url,
        capability: Capability,
        cancel: &CancellationToken,
        mut call: F,
    ) -> FeatureResult<Vec<DocumentContribution<R>>>
    where
        R: NonEmpty,
        F: FnMut(&E, &Document, &VirtualDocument) -> EngineResult<R>,
    {
        if self.source.valid_document(host_uri).is_none() {
            trace!(target: "mosaic::dispatch", "{} is not a valid document", host_uri);
            return Ok(Vec::new());
        }
        let Some(extraction) = self.source.extraction(host_uri) else {
            return Ok(Vec::new());
        };

        let mut contributions = Vec::new();
        let candidates = extraction.documents().iter().filter(|virtual_doc| {
            virtual_doc
                .mappings()
                .iter()
                .any(|mapping| mapping.capabilities.contains(capability))
        });
        for virtual_doc in candidates {
            if cancel.is_cancelled() {
                return Err(RequestCancelled);
            }
            let Some(document) = self.current_document(virtual_doc) else {
                continue;
            };

            match call(self.engine, &document, virtual_doc) {
                Ok(value) if value.is_non_empty() => contributions.push(DocumentContribution {
                    document: Arc::clone(virtual_doc),
                    value,
                }),
                Ok(_) => {}
                Err(e) => debug!(
                    target: "mosaic::dispatch",
                    "{} request for {} failed: {}",
                    capability,
                    document.uri(),
                    e
                ),
            }
        }

        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }
        Ok(contributions)
    }

    /// Cache snapshot of a virtual document, only if it is the exact version
    /// the mapping was computed against.
    fn current_document(&self, virtual_doc: &VirtualDocument) -> Option<Arc<Document>> {
        let document = self.source.valid_document(virtual_doc.uri())?;
        if document.version() != virtual_doc.version() {
            debug!(
                target: "mosaic::dispatch",
                "skipping superseded snapshot of {} ({} != {})",
                virtual_doc.uri(),
                document.version(),
                virtual_doc.version()
            );
            return None;
        }
        Some(document)
    }
}
