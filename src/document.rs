pub mod cache;
pub mod host;
pub mod store;
pub mod uri;

mod model;

// Re-export main types
pub use cache::DocumentCache;
pub use host::{HostEnvironment, SnapshotProvider};
pub use model::{Document, Revision, Snapshot, VersionToken};
pub use store::DocumentStore;
pub use uri::{uri_to_url, url_to_uri};
