use std::path::PathBuf;

use dashmap::DashMap;
use url::Url;

use super::{HostEnvironment, Snapshot, SnapshotProvider, VersionToken};

/// In-memory host environment driven by open/change/close notifications.
///
/// Used by the CLI and tests; an editor integration would implement
/// [`HostEnvironment`] over its own document state instead.
pub struct DocumentStore {
    documents: DashMap<Url, Snapshot>,
    current_directory: PathBuf,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self {
            documents: DashMap::new(),
            current_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
        }
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current_directory(current_directory: impl Into<PathBuf>) -> Self {
        Self {
            documents: DashMap::new(),
            current_directory: current_directory.into(),
        }
    }

    pub fn open(
        &self,
        uri: Url,
        language_id: impl Into<String>,
        version: impl Into<VersionToken>,
        text: impl Into<String>,
    ) {
        self.documents
            .insert(uri, Snapshot::new(version, language_id, text));
    }

    /// Replace the full text of an open document. Returns `false` if the
    /// document is not open.
    pub fn change(&self, uri: &Url, version: impl Into<VersionToken>, text: impl Into<String>) -> bool {
        match self.documents.get_mut(uri) {
            Some(mut snapshot) => {
                snapshot.version = version.into();
                snapshot.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn close(&self, uri: &Url) -> Option<Snapshot> {
        self.documents.remove(uri).map(|(_, snapshot)| snapshot)
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn get_document_text(&self, uri: &Url) -> Option<String> {
        self.documents.get(uri).map(|doc| doc.text.clone())
    }

    pub fn uris(&self) -> Vec<Url> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl SnapshotProvider for DocumentStore {
    fn script_version(&self, uri: &Url) -> Option<VersionToken> {
        self.documents.get(uri).map(|doc| doc.version.clone())
    }

    fn script_snapshot(&self, uri: &Url) -> Option<Snapshot> {
        self.documents.get(uri).map(|doc| doc.value().clone())
    }
}

impl HostEnvironment for DocumentStore {
    fn current_directory(&self) -> PathBuf {
        self.current_directory.clone()
    }
}
