use std::fmt;

use serde::{Deserialize, Serialize};
use tower_lsp_server::ls_types::Range;
use url::Url;

use crate::text::{PositionMapper, compute_line_starts};

/// Opaque version token reported by the host environment.
///
/// Only equality is meaningful. Editors usually report integers; virtual
/// documents derive tokens of the form `"{host}#{fingerprint}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for VersionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<i32> for VersionToken {
    fn from(version: i32) -> Self {
        Self(version.to_string())
    }
}

/// Internal replacement counter of a cached URI: 0 for the first snapshot,
/// previous + 1 on every replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Revision(u64);

impl Revision {
    pub const INITIAL: Revision = Revision(0);

    pub fn next(self) -> Self {
        Revision(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Text of a document as reported by a [`SnapshotProvider`](super::SnapshotProvider).
///
/// Version and text always travel together so a cache entry can never pair a
/// version with text from a different edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub version: VersionToken,
    pub language_id: String,
    pub text: String,
}

impl Snapshot {
    pub fn new(
        version: impl Into<VersionToken>,
        language_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            language_id: language_id.into(),
            text: text.into(),
        }
    }
}

/// Immutable cached text snapshot of a tracked document.
#[derive(Debug)]
pub struct Document {
    uri: Url,
    language_id: String,
    version: VersionToken,
    revision: Revision,
    text: String,
    line_starts: Vec<usize>,
}

impl Document {
    pub fn from_snapshot(uri: Url, snapshot: Snapshot, revision: Revision) -> Self {
        let line_starts = compute_line_starts(&snapshot.text);
        Self {
            uri,
            language_id: snapshot.language_id,
            version: snapshot.version,
            revision,
            text: snapshot.text,
            line_starts,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> &VersionToken {
        &self.version
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get a position mapper for this document
    pub fn position_mapper(&self) -> PositionMapper<'_> {
        PositionMapper::with_line_starts(&self.text, &self.line_starts)
    }

    pub fn full_range(&self) -> Range {
        self.position_mapper().full_range()
    }
}
