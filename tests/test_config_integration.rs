//! Configuration files flowing into a running language service.

mod helpers;

use helpers::engine::RecordingEngine;
use helpers::workspace::Workspace;
use helpers::{host_uri, pos, ts_region};
use mosaic_ls::config::load_config_file;
use mosaic_ls::embedding::{Capability, CapabilitySet, SourceMapping};
use mosaic_ls::error::ConfigError;
use rstest::rstest;
use tokio_util::sync::CancellationToken;

const HOST: &str = "<script>let count = 1;</script>";

fn write_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("mosaic-ls.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[rstest]
#[case::specific_deny("[languages.typescript]\ndeny = [\"hover\"]\n", false)]
#[case::wildcard_deny("[languages._]\ndeny = [\"hover\"]\n", false)]
#[case::other_language("[languages.css]\ndeny = [\"hover\"]\n", true)]
#[case::empty_file("", true)]
fn config_file_decides_whether_hover_reaches_the_engine(
    #[case] contents: &str,
    #[case] hover_allowed: bool,
) {
    let dir = tempfile::tempdir().unwrap();
    let settings = load_config_file(&write_config(&dir, contents)).unwrap();
    let workspace = Workspace::with_settings(RecordingEngine::new(), settings);
    workspace.open_host(
        HOST,
        vec![ts_region("script", "let count = 1;", vec![SourceMapping::offset(8, 0, 14)])],
    );

    workspace
        .service
        .hover(&host_uri(), pos(0, 12), &CancellationToken::new())
        .unwrap();

    assert_eq!(!workspace.engine().calls_for("hover").is_empty(), hover_allowed);
}

#[test]
fn wildcard_deny_survives_a_specific_allow() {
    let dir = tempfile::tempdir().unwrap();
    let settings = load_config_file(&write_config(
        &dir,
        r#"
        [languages._]
        deny = ["formatting"]

        [languages.typescript]
        allow = ["hover", "formatting", "rename"]
        "#,
    ))
    .unwrap();

    assert_eq!(
        settings.effective_capabilities("typescript", CapabilitySet::all()),
        CapabilitySet::empty()
            .with(Capability::Hover)
            .with(Capability::Rename)
    );
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn unknown_key_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[languages.typescript]\nblock = [\"hover\"]\n");
    assert!(matches!(
        load_config_file(&path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn reloaded_config_applies_to_open_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "");
    let workspace =
        Workspace::with_settings(RecordingEngine::new(), load_config_file(&path).unwrap());
    workspace.open_host(
        HOST,
        vec![ts_region("script", "let count = 1;", vec![SourceMapping::offset(8, 0, 14)])],
    );
    let cancel = CancellationToken::new();
    workspace.service.completion(&host_uri(), pos(0, 12), &cancel).unwrap();

    std::fs::write(&path, "[languages.typescript]\nallow = [\"diagnostic\"]\n").unwrap();
    workspace
        .service
        .apply_settings(load_config_file(&path).unwrap());
    workspace.service.completion(&host_uri(), pos(0, 12), &cancel).unwrap();
    workspace.service.diagnostics(&host_uri(), &cancel).unwrap();

    assert_eq!(workspace.engine().calls_for("completion").len(), 1);
    assert_eq!(workspace.engine().calls_for("diagnostics").len(), 1);
}
