use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;

use super::CapabilitySet;
use crate::document::Document;
use crate::text::Span;

/// How a host span corresponds to its virtual span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingMode {
    /// Content-preserving: equal lengths and identical text, so every
    /// sub-range maps one-to-one.
    #[default]
    Offset,
    /// Transformed text: the spans correspond only as wholes and at their
    /// exact boundaries.
    Gate,
}

/// One correspondence between a host span and a virtual span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapping {
    pub host: Span,
    #[serde(rename = "virtual")]
    pub virtual_span: Span,
    #[serde(default)]
    pub mode: MappingMode,
    #[serde(default = "CapabilitySet::all")]
    pub capabilities: CapabilitySet,
}

impl SourceMapping {
    /// Content-preserving mapping of `len` bytes.
    pub fn offset(host_start: usize, virtual_start: usize, len: usize) -> Self {
        Self {
            host: Span::new(host_start, host_start + len),
            virtual_span: Span::new(virtual_start, virtual_start + len),
            mode: MappingMode::Offset,
            capabilities: CapabilitySet::all(),
        }
    }

    /// Whole-span mapping between spans of possibly different lengths.
    pub fn gate(host: Span, virtual_span: Span) -> Self {
        Self {
            host,
            virtual_span,
            mode: MappingMode::Gate,
            capabilities: CapabilitySet::all(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Project a host sub-span into virtual coordinates.
    ///
    /// Offset mappings clip to the overlap; an empty span maps when it lies
    /// within the closed host span. Gate mappings require the host span to be
    /// covered entirely, or an empty span sitting exactly on a boundary.
    pub fn project_to_virtual(&self, host: Span) -> Option<(Span, Span)> {
        project(self.mode, self.host, self.virtual_span, host, Reach::Overlap)
    }

    /// Project a virtual sub-span into host coordinates.
    ///
    /// The virtual span must lie fully inside this mapping.
    pub fn project_to_host(&self, virtual_span: Span) -> Option<Span> {
        project(
            self.mode,
            self.virtual_span,
            self.host,
            virtual_span,
            Reach::Contained,
        )
        .map(|(_, target)| target)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Reach {
    /// Any overlap maps (clipped).
    Overlap,
    /// The query must lie inside the source span.
    Contained,
}

/// Returns the clipped source span and its image in the target space.
fn project(
    mode: MappingMode,
    source: Span,
    target: Span,
    query: Span,
    reach: Reach,
) -> Option<(Span, Span)> {
    if query.is_empty() {
        let p = query.start;
        return match mode {
            MappingMode::Offset if source.start <= p && p <= source.end => {
                let mapped = target.start + (p - source.start);
                Some((query, Span::empty(mapped)))
            }
            MappingMode::Gate if p == source.start => Some((query, Span::empty(target.start))),
            MappingMode::Gate if p == source.end => Some((query, Span::empty(target.end))),
            _ => None,
        };
    }

    match mode {
        MappingMode::Offset => {
            let clipped = match reach {
                Reach::Overlap => source.intersection(query)?,
                Reach::Contained => source.contains(query).then_some(query)?,
            };
            let start = target.start + (clipped.start - source.start);
            Some((clipped, Span::new(start, start + clipped.len())))
        }
        MappingMode::Gate => {
            let covered = match reach {
                Reach::Overlap => query.contains(source),
                Reach::Contained => query == source,
            };
            covered.then_some((source, target))
        }
    }
}

/// One embedded region as produced by an [`Extractor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRegion {
    /// Stable identifier unique within the host (e.g. `script`, `style_0`).
    pub region_id: String,
    pub language_id: String,
    /// Full virtual document text, including synthetic scaffolding.
    pub text: String,
    pub mappings: Vec<SourceMapping>,
}

/// Splits a host document into embedded regions.
///
/// Implementations own all knowledge of the host syntax; this crate never
/// parses any language itself.
pub trait Extractor: Send + Sync {
    fn extract(&self, host: &Document) -> Vec<ExtractedRegion>;
}

/// Extractor serving fixed region tables keyed by host URI.
///
/// Offsets are absolute and not adjusted when the host text changes; callers
/// replace the table together with the text.
#[derive(Default)]
pub struct StaticExtractor {
    regions: DashMap<Url, Vec<ExtractedRegion>>,
}

impl StaticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, host_uri: Url, regions: Vec<ExtractedRegion>) {
        self.regions.insert(host_uri, regions);
    }

    pub fn remove(&self, host_uri: &Url) {
        self.regions.remove(host_uri);
    }
}

impl Extractor for StaticExtractor {
    fn extract(&self, host: &Document) -> Vec<ExtractedRegion> {
        self.regions
            .get(host.uri())
            .map(|regions| regions.value().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::inside(Span::new(12, 15), Some(Span::new(2, 5)))]
    #[case::clipped_left(Span::new(5, 12), Some(Span::new(0, 2)))]
    #[case::clipped_right(Span::new(18, 30), Some(Span::new(8, 10)))]
    #[case::cursor_at_start(Span::empty(10), Some(Span::empty(0)))]
    #[case::cursor_at_end(Span::empty(20), Some(Span::empty(10)))]
    #[case::cursor_outside(Span::empty(21), None)]
    #[case::disjoint(Span::new(20, 25), None)]
    fn offset_to_virtual(#[case] host: Span, #[case] expected: Option<Span>) {
        let mapping = SourceMapping::offset(10, 0, 10);
        assert_eq!(
            mapping.project_to_virtual(host).map(|(_, v)| v),
            expected
        );
    }

    #[rstest]
    #[case::whole(Span::new(10, 20), Some(Span::new(3, 7)))]
    #[case::covering(Span::new(0, 30), Some(Span::new(3, 7)))]
    #[case::partial(Span::new(12, 15), None)]
    #[case::start_boundary(Span::empty(10), Some(Span::empty(3)))]
    #[case::end_boundary(Span::empty(20), Some(Span::empty(7)))]
    #[case::interior_cursor(Span::empty(15), None)]
    fn gate_to_virtual(#[case] host: Span, #[case] expected: Option<Span>) {
        let mapping = SourceMapping::gate(Span::new(10, 20), Span::new(3, 7));
        assert_eq!(
            mapping.project_to_virtual(host).map(|(_, v)| v),
            expected
        );
    }

    #[test]
    fn to_host_requires_containment() {
        let offset = SourceMapping::offset(10, 0, 10);
        assert_eq!(offset.project_to_host(Span::new(2, 4)), Some(Span::new(12, 14)));
        assert_eq!(offset.project_to_host(Span::new(8, 12)), None);

        let gate = SourceMapping::gate(Span::new(10, 20), Span::new(3, 7));
        assert_eq!(gate.project_to_host(Span::new(3, 7)), Some(Span::new(10, 20)));
        assert_eq!(gate.project_to_host(Span::new(2, 7)), None);
        assert_eq!(gate.project_to_host(Span::new(4, 5)), None);
    }

    #[test]
    fn mapping_defaults_when_deserialized() {
        let mapping: SourceMapping = serde_json::from_str(
            r#"{ "host": { "start": 4, "end": 8 }, "virtual": { "start": 0, "end": 4 } }"#,
        )
        .unwrap();
        assert_eq!(mapping.mode, MappingMode::Offset);
        assert_eq!(mapping.capabilities, CapabilitySet::all());
    }
}
