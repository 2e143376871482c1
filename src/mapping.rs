//! Coordinate translation between host documents and virtual documents.

pub mod mapped_range;
pub mod range_mapper;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;

use url::Url;

use crate::embedding::{Extraction, VirtualDocument};

pub use mapped_range::{HostRange, MappedRange, RegionOrder};
pub use range_mapper::{RangeMapper, map_to_host, map_to_virtual};

/// Where the range mapper and edit translator look up extraction state.
///
/// Implementations must hand out consistent snapshots: the extraction returned
/// for a host belongs to the host's current version, and a virtual document is
/// returned together with the extraction that owns it.
pub trait MappingSource {
    /// Current extraction of a host document.
    fn extraction(&self, host_uri: &Url) -> Option<Arc<Extraction>>;

    /// A registered virtual document and the extraction that owns it.
    fn virtual_document(&self, virtual_uri: &Url)
    -> Option<(Arc<Extraction>, Arc<VirtualDocument>)>;

    /// Whether a non-virtual URI is known to the host environment.
    fn is_tracked(&self, uri: &Url) -> bool;
}
