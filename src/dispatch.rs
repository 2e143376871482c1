//! Routing of language features through virtual documents.
//!
//! Every feature follows the same pipeline: validate the host document, map
//! the request range into virtual documents, keep regions whose mapping
//! grants the feature's capability, call the engine per virtual document,
//! and map the results back into host coordinates.

mod dispatcher;
mod features;
pub mod translate;

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::document::Document;
use crate::mapping::MappingSource;

pub use dispatcher::{Contribution, DocumentContribution, FanOut, FeatureDispatcher, NonEmpty};
pub use translate::ResultTranslator;

/// Extraction state plus access to engine-valid document snapshots.
pub trait DispatchSource: MappingSource {
    /// Cache snapshot of `uri`, only if the host environment tracks it and the
    /// engine's program contains it.
    fn valid_document(&self, uri: &Url) -> Option<Arc<Document>>;

    /// Directory the host resolves relative paths against.
    fn current_directory(&self) -> PathBuf;
}
