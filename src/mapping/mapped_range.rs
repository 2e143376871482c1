use std::sync::Arc;

use tower_lsp_server::ls_types::Range;
use url::Url;

use crate::embedding::{Capability, CapabilitySet, VirtualDocument};
use crate::text::Span;

/// Deterministic ordering key of a mapping within one extraction.
///
/// Ascending host start offset, then declaration order of the virtual
/// document, then declaration order of the mapping inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionOrder {
    pub host_start: usize,
    pub document: usize,
    pub mapping: usize,
}

/// A host range projected into one virtual document.
#[derive(Debug, Clone)]
pub struct MappedRange {
    pub host_range: Range,
    pub host_span: Span,
    pub virtual_range: Range,
    pub virtual_span: Span,
    pub document: Arc<VirtualDocument>,
    pub capabilities: CapabilitySet,
    /// Length of the originating mapping's host span.
    pub region_len: usize,
    pub order: RegionOrder,
}

impl MappedRange {
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn virtual_uri(&self) -> &Url {
        self.document.uri()
    }
}

/// A virtual range projected back into its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRange {
    pub host_uri: Url,
    pub range: Range,
    pub span: Span,
    pub capabilities: CapabilitySet,
    pub region_len: usize,
    pub order: RegionOrder,
}

impl HostRange {
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }
}
