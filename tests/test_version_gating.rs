//! The engine only ever sees the snapshot matching the host's current version.

mod helpers;

use helpers::engine::RecordingEngine;
use helpers::workspace::{Workspace, virtual_uri};
use helpers::{host_uri, pos, verbatim_region};
use mosaic_ls::dispatch::DispatchSource;
use mosaic_ls::text::fingerprint;
use tokio_util::sync::CancellationToken;

const V1: &str = "<script>let a = 1;</script>";
const V2: &str = "<script>let abc = 2;</script>";

#[test]
fn engine_sees_text_of_the_current_version() {
    let workspace = Workspace::new(RecordingEngine::new());
    let cancel = CancellationToken::new();

    workspace.open_host(V1, vec![verbatim_region("script", V1, "let a = 1;")]);
    workspace.service.hover(&host_uri(), pos(0, 12), &cancel).unwrap();

    workspace.change_host(2, V2, vec![verbatim_region("script", V2, "let abc = 2;")]);
    workspace.service.hover(&host_uri(), pos(0, 12), &cancel).unwrap();

    let calls = workspace.engine().calls_for("hover");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].text, "let a = 1;");
    assert_eq!(calls[0].version, format!("1#{}", fingerprint("let a = 1;")));
    assert_eq!(calls[1].text, "let abc = 2;");
    assert_eq!(calls[1].version, format!("2#{}", fingerprint("let abc = 2;")));
}

#[test]
fn unchanged_host_reuses_the_cached_snapshot() {
    let workspace = Workspace::new(RecordingEngine::new());
    workspace.open_host(V1, vec![verbatim_region("script", V1, "let a = 1;")]);

    let first = workspace.service.valid_document(&virtual_uri("script")).unwrap();
    let second = workspace.service.valid_document(&virtual_uri("script")).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(second.revision().get(), 0);
}

#[test]
fn host_revision_counts_replacements() {
    let workspace = Workspace::new(RecordingEngine::new());
    workspace.open_host(V1, vec![verbatim_region("script", V1, "let a = 1;")]);
    let first = workspace.service.valid_document(&host_uri()).unwrap();

    workspace.change_host(2, V2, vec![verbatim_region("script", V2, "let abc = 2;")]);
    let second = workspace.service.valid_document(&host_uri()).unwrap();

    assert_eq!(first.revision().get(), 0);
    assert_eq!(second.revision().get(), 1);
    assert_eq!(second.version().as_str(), "2");
}

#[test]
fn new_host_version_changes_virtual_version_even_with_same_text() {
    let workspace = Workspace::new(RecordingEngine::new());
    workspace.open_host(V1, vec![verbatim_region("script", V1, "let a = 1;")]);
    let before = workspace.service.valid_document(&virtual_uri("script")).unwrap();

    workspace.change_host(3, V1, vec![verbatim_region("script", V1, "let a = 1;")]);
    let after = workspace.service.valid_document(&virtual_uri("script")).unwrap();

    assert_ne!(before.version(), after.version());
    assert!(after.version().as_str().starts_with("3#"));
}

#[test]
fn removed_region_disappears_with_the_new_version() {
    let workspace = Workspace::new(RecordingEngine::new());
    workspace.open_host(V1, vec![verbatim_region("script", V1, "let a = 1;")]);
    assert!(workspace.service.valid_document(&virtual_uri("script")).is_some());

    workspace.change_host(2, "<p>no script</p>", Vec::new());
    // Any request against the host resynchronizes it.
    let cancel = CancellationToken::new();
    workspace.service.hover(&host_uri(), pos(0, 1), &cancel).unwrap();

    assert!(workspace.service.valid_document(&virtual_uri("script")).is_none());
    assert!(workspace.service.cache().peek(&virtual_uri("script")).is_none());
}

#[test]
fn closing_the_host_makes_features_unavailable() {
    let workspace = Workspace::new(RecordingEngine::new());
    let cancel = CancellationToken::new();
    workspace.open_host(V1, vec![verbatim_region("script", V1, "let a = 1;")]);
    workspace.service.hover(&host_uri(), pos(0, 12), &cancel).unwrap();

    workspace.store.close(&host_uri());
    workspace.service.evict(&host_uri());

    assert!(workspace.service.hover(&host_uri(), pos(0, 12), &cancel).unwrap().is_none());
    assert_eq!(workspace.engine().calls_for("hover").len(), 1);
    assert!(workspace.service.cache().is_empty());
}
