use log::trace;
use tower_lsp_server::ls_types::{Position, Range};
use url::Url;

use super::{HostRange, MappedRange, MappingSource, RegionOrder};
use crate::embedding::{Extraction, VirtualDocument};

/// Translates ranges between a host document and its virtual documents.
///
/// Capabilities are attached to every result but never filtered here; the
/// feature layer decides what it may use.
pub struct RangeMapper<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: MappingSource + ?Sized> RangeMapper<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Every virtual range overlapping `range` of `host_uri`, in region order.
    pub fn to_virtual(&self, host_uri: &Url, range: Range) -> Vec<MappedRange> {
        match self.source.extraction(host_uri) {
            Some(extraction) => map_to_virtual(&extraction, range),
            None => {
                trace!(target: "mosaic::mapping", "no extraction for {}", host_uri);
                Vec::new()
            }
        }
    }

    pub fn position_to_virtual(&self, host_uri: &Url, position: Position) -> Vec<MappedRange> {
        self.to_virtual(host_uri, Range::new(position, position))
    }

    /// Host ranges of every mapping of `virtual_uri` that fully contains `range`.
    pub fn to_host(&self, virtual_uri: &Url, range: Range) -> Vec<HostRange> {
        match self.source.virtual_document(virtual_uri) {
            Some((extraction, document)) => map_to_host(&extraction, &document, range),
            None => {
                trace!(target: "mosaic::mapping", "unknown virtual document {}", virtual_uri);
                Vec::new()
            }
        }
    }

    pub fn position_to_host(&self, virtual_uri: &Url, position: Position) -> Vec<HostRange> {
        self.to_host(virtual_uri, Range::new(position, position))
    }
}

/// Host → virtual over one extraction snapshot.
pub fn map_to_virtual(extraction: &Extraction, range: Range) -> Vec<MappedRange> {
    let host_mapper = extraction.host().position_mapper();
    let Some(host_span) = host_mapper.range_to_span(range) else {
        return Vec::new();
    };

    extraction
        .mappings_near(host_span)
        .into_iter()
        .filter_map(|(document, index)| {
            let mapping = &document.mappings()[index];
            let (clipped, virtual_span) = mapping.project_to_virtual(host_span)?;
            Some(MappedRange {
                host_range: host_mapper.span_to_range(clipped)?,
                host_span: clipped,
                virtual_range: document.position_mapper().span_to_range(virtual_span)?,
                virtual_span,
                document: std::sync::Arc::clone(document),
                capabilities: mapping.capabilities,
                region_len: mapping.host.len(),
                order: RegionOrder {
                    host_start: mapping.host.start,
                    document: document.declaration_index(),
                    mapping: index,
                },
            })
        })
        .collect()
}

/// Virtual → host for one document of `extraction`.
///
/// Engine ranges must lie on existing virtual text: a column past its line
/// end maps nowhere rather than being clamped.
pub fn map_to_host(extraction: &Extraction, document: &VirtualDocument, range: Range) -> Vec<HostRange> {
    let Some(virtual_span) = document.position_mapper().range_to_span_strict(range) else {
        return Vec::new();
    };
    let host_mapper = extraction.host().position_mapper();

    let mut ranges: Vec<HostRange> = document
        .mappings()
        .iter()
        .enumerate()
        .filter_map(|(index, mapping)| {
            let span = mapping.project_to_host(virtual_span)?;
            Some(HostRange {
                host_uri: document.host_uri().clone(),
                range: host_mapper.span_to_range(span)?,
                span,
                capabilities: mapping.capabilities,
                region_len: mapping.host.len(),
                order: RegionOrder {
                    host_start: mapping.host.start,
                    document: document.declaration_index(),
                    mapping: index,
                },
            })
        })
        .collect();

    ranges.sort_by_key(|host| host.order);
    let mut seen = Vec::with_capacity(ranges.len());
    ranges.retain(|host| {
        let key = (host.span, host.capabilities);
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
    ranges
}
