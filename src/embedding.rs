//! Embedded regions of host documents and the virtual documents built from them.

pub mod capability;
pub mod region;
pub mod registry;
pub mod virtual_uri;

pub use capability::{Capability, CapabilitySet};
pub use region::{ExtractedRegion, Extractor, MappingMode, SourceMapping, StaticExtractor};
pub use registry::{Extraction, RegionRegistry, SyncOutcome, VirtualDocument};
pub use virtual_uri::{is_virtual_uri, language_to_extension, virtual_document_uri};
