pub mod config;
pub mod dispatch;
pub mod document;
pub mod edit;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod service;
pub mod text;

pub use config::MosaicSettings;
pub use document::{Document, DocumentCache, DocumentStore, HostEnvironment, VersionToken};
pub use edit::EditTranslator;
pub use embedding::{
    Capability, CapabilitySet, ExtractedRegion, Extractor, MappingMode, SourceMapping,
    StaticExtractor,
};
pub use engine::{InstrumentedEngine, LanguageEngine};
pub use error::{EngineError, EngineResult, FeatureResult, RequestCancelled};
pub use mapping::{MappedRange, RangeMapper};
pub use service::LanguageService;
