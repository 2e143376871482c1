use std::path::PathBuf;

use url::Url;

use super::{Snapshot, VersionToken};

/// Source of versioned text snapshots.
///
/// Implemented by the host environment for real documents and by region
/// extractions for the virtual documents they own.
pub trait SnapshotProvider {
    /// Version the provider currently reports for `uri`, if it tracks it.
    fn script_version(&self, uri: &Url) -> Option<VersionToken>;

    /// Current text of `uri` together with the version it belongs to.
    fn script_snapshot(&self, uri: &Url) -> Option<Snapshot>;
}

/// The editor-side collaborator that owns document versions and text.
pub trait HostEnvironment: SnapshotProvider + Send + Sync {
    /// Directory relative paths are resolved against.
    fn current_directory(&self) -> PathBuf;
}
