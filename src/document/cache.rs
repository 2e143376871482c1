//! Version-gated snapshot cache.
//!
//! Holds one immutable [`Document`] per URI. A read first asks the provider
//! which version is current and only hands out an entry whose version matches,
//! so no caller ever sees text the editor has already superseded.
//!
//! # Concurrency
//!
//! Each URI owns a slot with an `ArcSwapOption` (wait-free reads, atomic
//! replacement) and a mutex that serializes writers. Resynchronization
//! re-checks the stored version after taking the mutex, so concurrent readers
//! racing on the same new version fetch the snapshot once.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use log::{debug, trace};
use url::Url;

use super::{Document, Revision, SnapshotProvider, VersionToken};
use crate::error::LockResultExt;

#[derive(Default)]
struct CacheSlot {
    current: ArcSwapOption<Document>,
    sync: Mutex<()>,
}

/// Cache of document snapshots keyed by URI.
#[derive(Default)]
pub struct DocumentCache {
    slots: DashMap<Url, Arc<CacheSlot>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, uri: &Url) -> Arc<CacheSlot> {
        if let Some(slot) = self.slots.get(uri) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(uri.clone()).or_default().value())
    }

    /// Return the snapshot of `uri` that matches the provider's current version.
    ///
    /// Returns `None` when the provider does not track the URI (any stale
    /// entry is dropped in that case).
    pub fn get_document(
        &self,
        uri: &Url,
        provider: &dyn SnapshotProvider,
    ) -> Option<Arc<Document>> {
        let Some(version) = provider.script_version(uri) else {
            self.evict(uri);
            return None;
        };

        if let Some(slot) = self.slots.get(uri)
            && let Some(doc) = slot.current.load_full()
            && *doc.version() == version
        {
            trace!(target: "mosaic::cache", "hit {} @ {}", uri, version);
            return Some(doc);
        }

        self.resynchronize(uri, &version, provider)
    }

    /// Refresh the entry of `uri` so that it matches `new_version`.
    ///
    /// The snapshot fetched from the provider carries its own version, which
    /// may already be newer than `new_version`; the stored entry always pairs
    /// the text with the version it came with.
    pub fn resynchronize(
        &self,
        uri: &Url,
        new_version: &VersionToken,
        provider: &dyn SnapshotProvider,
    ) -> Option<Arc<Document>> {
        let slot = self.slot(uri);
        let _guard = slot.sync.lock().recover_poison("DocumentCache::resynchronize");

        let previous = slot.current.load_full();
        if let Some(doc) = &previous
            && doc.version() == new_version
        {
            // Another writer finished the same resync while we waited.
            return previous;
        }

        let Some(snapshot) = provider.script_snapshot(uri) else {
            debug!(target: "mosaic::cache", "no snapshot for {}, dropping entry", uri);
            slot.current.store(None);
            drop(_guard);
            self.slots.remove_if(uri, |_, s| Arc::ptr_eq(s, &slot));
            return None;
        };

        let revision = previous
            .as_ref()
            .map_or(Revision::INITIAL, |doc| doc.revision().next());
        debug!(
            target: "mosaic::cache",
            "resync {} -> {} (revision {})",
            uri,
            snapshot.version,
            revision.get()
        );
        let doc = Arc::new(Document::from_snapshot(uri.clone(), snapshot, revision));
        slot.current.store(Some(Arc::clone(&doc)));
        Some(doc)
    }

    /// Like [`get_document`](Self::get_document), but only for URIs the engine
    /// can analyze.
    pub fn get_valid_document(
        &self,
        uri: &Url,
        provider: &dyn SnapshotProvider,
        membership: impl FnOnce(&Url) -> bool,
    ) -> Option<Arc<Document>> {
        if !membership(uri) {
            trace!(target: "mosaic::cache", "{} is not an analyzable unit", uri);
            return None;
        }
        self.get_document(uri, provider)
    }

    /// Current entry of `uri` without consulting any provider.
    pub fn peek(&self, uri: &Url) -> Option<Arc<Document>> {
        self.slots.get(uri).and_then(|slot| slot.current.load_full())
    }

    pub fn evict(&self, uri: &Url) {
        if self.slots.remove(uri).is_some() {
            debug!(target: "mosaic::cache", "evicted {}", uri);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
