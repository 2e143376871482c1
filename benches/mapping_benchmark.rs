//! Benchmark for host → virtual range mapping.
//!
//! Measures interval lookup and extraction cost for documents with varying
//! numbers of embedded blocks.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mosaic_ls::config::MosaicSettings;
use mosaic_ls::document::{Document, Revision, Snapshot};
use mosaic_ls::embedding::{ExtractedRegion, Extraction, SourceMapping};
use mosaic_ls::mapping::{map_to_host, map_to_virtual};
use tower_lsp_server::ls_types::{Position, Range};
use url::Url;

/// Generate a Markdown document with N Lua code blocks, and one region per
/// block mapping the block body.
fn generate_markdown_with_blocks(num_blocks: usize) -> (String, Vec<ExtractedRegion>) {
    let mut doc = String::with_capacity(num_blocks * 50);
    let mut regions = Vec::with_capacity(num_blocks);
    doc.push_str("# Benchmark Document\n\n");

    for i in 0..num_blocks {
        doc.push_str(&format!("## Section {}\n\n```lua\n", i));
        let body = format!("local var_{} = {}\n", i, i);
        let start = doc.len();
        doc.push_str(&body);
        doc.push_str("```\n\n");

        regions.push(ExtractedRegion {
            region_id: format!("lua_{}", i),
            language_id: "lua".to_string(),
            text: body.clone(),
            mappings: vec![SourceMapping::offset(start, 0, body.len())],
        });
    }

    (doc, regions)
}

fn extraction(num_blocks: usize) -> Extraction {
    let (text, regions) = generate_markdown_with_blocks(num_blocks);
    let host = Arc::new(Document::from_snapshot(
        Url::parse("file:///bench/doc.md").expect("valid uri"),
        Snapshot::new(1, "markdown", text),
        Revision::INITIAL,
    ));
    Extraction::new(host, regions, &MosaicSettings::default(), 0)
}

fn benchmark_position_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("position_to_virtual");

    for num_blocks in [10, 100, 1000].iter() {
        let extraction = extraction(*num_blocks);
        // Inside the body of the middle block: heading, blank, fence, body.
        let line = (num_blocks / 2) as u32 * 6 + 5;
        let position = Position::new(line, 7);

        group.bench_with_input(
            BenchmarkId::new("middle_block", num_blocks),
            &extraction,
            |b, extraction| b.iter(|| map_to_virtual(extraction, Range::new(position, position))),
        );
    }

    group.finish();
}

fn benchmark_round_trip(c: &mut Criterion) {
    let extraction = extraction(1000);
    let position = Position::new(500 * 6 + 5, 7);

    c.bench_function("round_trip_1000_blocks", |b| {
        b.iter(|| {
            let mapped = map_to_virtual(&extraction, Range::new(position, position));
            mapped
                .iter()
                .map(|m| map_to_host(&extraction, &m.document, m.virtual_range).len())
                .sum::<usize>()
        })
    });
}

fn benchmark_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    group.sample_size(20);

    for num_blocks in [100, 2000].iter() {
        let (text, regions) = generate_markdown_with_blocks(*num_blocks);
        let host = Arc::new(Document::from_snapshot(
            Url::parse("file:///bench/doc.md").expect("valid uri"),
            Snapshot::new(1, "markdown", text),
            Revision::INITIAL,
        ));

        group.bench_with_input(
            BenchmarkId::new("build", num_blocks),
            &(host, regions),
            |b, (host, regions)| {
                b.iter(|| {
                    Extraction::new(Arc::clone(host), regions.clone(), &MosaicSettings::default(), 0)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_position_mapping,
    benchmark_round_trip,
    benchmark_extraction
);
criterion_main!(benches);
