//! Shared test helpers for integration tests.
//!
//! Note: We use `helpers/mod.rs` instead of the modern `helpers.rs` + `helpers/` pattern
//! because Cargo auto-discovers top-level `.rs` files in `tests/` as integration tests.
//! A `tests/helpers.rs` file would be compiled as a standalone test, which we don't want.

#![allow(dead_code)]

pub mod engine;
pub mod workspace;

use mosaic_ls::embedding::{ExtractedRegion, SourceMapping};
use mosaic_ls::text::PositionMapper;
use tower_lsp_server::ls_types::{Position, Range, TextEdit};
use url::Url;

pub fn host_uri() -> Url {
    Url::parse("file:///project/App.vue").expect("valid host uri")
}

pub fn pos(line: u32, character: u32) -> Position {
    Position::new(line, character)
}

/// Range on a single line.
pub fn range(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}

pub fn edit(range: Range, new_text: &str) -> TextEdit {
    TextEdit {
        range,
        new_text: new_text.to_string(),
    }
}

/// A TypeScript region with the given mappings.
pub fn ts_region(id: &str, text: &str, mappings: Vec<SourceMapping>) -> ExtractedRegion {
    ExtractedRegion {
        region_id: id.to_string(),
        language_id: "typescript".to_string(),
        text: text.to_string(),
        mappings,
    }
}

/// Region whose virtual text is exactly `text`, found at its first occurrence
/// in `host`.
pub fn verbatim_region(id: &str, host: &str, text: &str) -> ExtractedRegion {
    let start = host.find(text).expect("region text occurs in host");
    ts_region(id, text, vec![SourceMapping::offset(start, 0, text.len())])
}

/// Apply non-overlapping edits to `text` the way an editor would.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mapper = PositionMapper::new(text);
    let mut spans: Vec<_> = edits
        .iter()
        .map(|e| (mapper.range_to_span(e.range).expect("edit inside text"), e))
        .collect();
    spans.sort_by_key(|(span, _)| std::cmp::Reverse(span.start));

    let mut result = text.to_string();
    for (span, edit) in spans {
        result.replace_range(span.start..span.end, &edit.new_text);
    }
    result
}
