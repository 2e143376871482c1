//! Transformers from engine results to host coordinates.
//!
//! Three kinds of URI can appear in an engine result:
//! - a registered virtual document → ranges are mapped back to its host
//! - a tracked real document (plain `.ts` file, another host) → kept as-is
//! - anything else, including stale virtual URIs → dropped
//!
//! Dropping is per item: one unmappable location never discards its
//! siblings, and an empty result stays empty rather than becoming an error.

use std::collections::HashMap;

use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_lsp_server::ls_types::{
    CallHierarchyItem, Diagnostic, DiagnosticRelatedInformation, DocumentChangeOperation,
    DocumentChanges, DocumentSymbol, Location, Range, SelectionRange, SymbolInformation, TextEdit,
    Uri, WorkspaceEdit,
};
use url::Url;

use crate::document::{uri_to_url, url_to_uri};
use crate::embedding::{Capability, is_virtual_uri};
use crate::mapping::{MappingSource, RangeMapper};

/// Key under which the virtual document of a resolvable item is remembered.
const DATA_KEY: &str = "mosaicVirtualDocument";

#[derive(Debug, Serialize, Deserialize)]
struct WrappedData {
    uri: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original: Option<Value>,
}

/// Stash `uri` alongside an item's own `data` so a later resolve request can
/// be routed back to the same virtual document.
pub fn wrap_data(uri: &Url, data: Option<Value>) -> Option<Value> {
    let wrapped = WrappedData {
        uri: uri.clone(),
        original: data,
    };
    let mut object = serde_json::Map::new();
    object.insert(DATA_KEY.to_string(), serde_json::to_value(wrapped).ok()?);
    Some(Value::Object(object))
}

/// Inverse of [`wrap_data`]. `None` when the data was not produced by us.
pub fn unwrap_data(data: Option<&Value>) -> Option<(Url, Option<Value>)> {
    let wrapped = data?.get(DATA_KEY)?;
    let wrapped: WrappedData = serde_json::from_value(wrapped.clone()).ok()?;
    Some((wrapped.uri, wrapped.original))
}

/// Maps engine results of one request back into host coordinates.
pub struct ResultTranslator<'a, S: ?Sized> {
    mapper: RangeMapper<'a, S>,
}

impl<'a, S: MappingSource + ?Sized> ResultTranslator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            mapper: RangeMapper::new(source),
        }
    }

    /// Host range of `range` in `virtual_uri`: the first mapping in region
    /// order that contains it and, if given, grants `capability`.
    pub fn range(
        &self,
        virtual_uri: &Url,
        range: Range,
        capability: Option<Capability>,
    ) -> Option<Range> {
        self.mapper
            .to_host(virtual_uri, range)
            .into_iter()
            .find(|host| capability.is_none_or(|cap| host.allows(cap)))
            .map(|host| host.range)
    }

    pub fn location(&self, location: Location) -> Option<Location> {
        let url = uri_to_url(&location.uri)?;
        let source = self.mapper.source();

        if source.virtual_document(&url).is_some() {
            let host = self.mapper.to_host(&url, location.range).into_iter().next();
            let Some(host) = host else {
                trace!(
                    target: "mosaic::dispatch",
                    "location {:?} of {} does not map back",
                    location.range,
                    url
                );
                return None;
            };
            return Some(Location {
                uri: url_to_uri(&host.host_uri)?,
                range: host.range,
            });
        }

        if is_virtual_uri(&url) || !source.is_tracked(&url) {
            trace!(target: "mosaic::dispatch", "dropping location in unknown document {}", url);
            return None;
        }
        Some(location)
    }

    /// Translate locations, dropping unmappable ones and duplicates.
    pub fn locations(&self, locations: Vec<Location>) -> Vec<Location> {
        let mut translated: Vec<Location> = Vec::with_capacity(locations.len());
        for location in locations.into_iter().filter_map(|l| self.location(l)) {
            if !translated.contains(&location) {
                translated.push(location);
            }
        }
        translated
    }

    /// A diagnostic of `virtual_uri`. Only mappings granting
    /// [`Capability::Diagnostic`] may carry it; related information that does
    /// not map is removed.
    pub fn diagnostic(&self, virtual_uri: &Url, diagnostic: Diagnostic) -> Option<Diagnostic> {
        let range = self.range(virtual_uri, diagnostic.range, Some(Capability::Diagnostic))?;
        let related_information = diagnostic.related_information.map(|related| {
            related
                .into_iter()
                .filter_map(|info| {
                    Some(DiagnosticRelatedInformation {
                        location: self.location(info.location)?,
                        message: info.message,
                    })
                })
                .collect::<Vec<_>>()
        });
        Some(Diagnostic {
            range,
            related_information,
            ..diagnostic
        })
    }

    /// Document symbols of `virtual_uri`.
    ///
    /// A symbol whose range does not map is dropped, but its mappable children
    /// are lifted into its place. A selection range that does not map falls
    /// back to the symbol's own range.
    #[allow(deprecated)]
    pub fn document_symbols(
        &self,
        virtual_uri: &Url,
        symbols: Vec<DocumentSymbol>,
    ) -> Vec<DocumentSymbol> {
        let mut translated = Vec::new();
        for symbol in symbols {
            let children = symbol
                .children
                .map(|children| self.document_symbols(virtual_uri, children));
            let Some(range) = self.range(virtual_uri, symbol.range, None) else {
                translated.extend(children.unwrap_or_default());
                continue;
            };
            let selection_range = self
                .range(virtual_uri, symbol.selection_range, None)
                .filter(|selection| contains(range, *selection))
                .unwrap_or(range);
            translated.push(DocumentSymbol {
                range,
                selection_range,
                children,
                ..symbol
            });
        }
        translated
    }

    #[allow(deprecated)]
    pub fn workspace_symbol(&self, symbol: SymbolInformation) -> Option<SymbolInformation> {
        let location = self.location(symbol.location)?;
        Some(SymbolInformation { location, ..symbol })
    }

    /// A selection range chain of `virtual_uri`, cut at the first ancestor
    /// that does not map.
    pub fn selection_range(&self, virtual_uri: &Url, selection: SelectionRange) -> Option<SelectionRange> {
        let range = self.range(virtual_uri, selection.range, None)?;
        let parent = selection
            .parent
            .and_then(|parent| self.selection_range(virtual_uri, *parent))
            .map(Box::new);
        Some(SelectionRange { range, parent })
    }

    /// A call hierarchy item, anchored on its selection range.
    ///
    /// The item is dropped when its name does not map. A full range that does
    /// not map, or no longer encloses the name, shrinks to the name. Items of
    /// virtual documents keep their engine-side form in `data` so follow-up
    /// requests reach the engine in its own coordinates.
    pub fn call_hierarchy_item(&self, item: CallHierarchyItem) -> Option<CallHierarchyItem> {
        let selection = self.location(Location {
            uri: item.uri.clone(),
            range: item.selection_range,
        })?;
        let range = self
            .location(Location {
                uri: item.uri.clone(),
                range: item.range,
            })
            .filter(|full| full.uri == selection.uri && contains(full.range, selection.range))
            .map_or(selection.range, |full| full.range);

        let data = match uri_to_url(&item.uri) {
            Some(url) if self.mapper.source().virtual_document(&url).is_some() => {
                wrap_data(&url, serde_json::to_value(&item).ok())
            }
            _ => item.data.clone(),
        };
        Some(CallHierarchyItem {
            uri: selection.uri,
            range,
            selection_range: selection.range,
            data,
            ..item
        })
    }

    /// Call-site ranges of `uri`, keeping those that map.
    pub fn call_ranges(&self, uri: &Uri, ranges: Vec<Range>) -> Vec<Range> {
        ranges
            .into_iter()
            .filter_map(|range| {
                self.location(Location {
                    uri: uri.clone(),
                    range,
                })
            })
            .map(|location| location.range)
            .collect()
    }
}

/// The engine-side form of an item produced by
/// [`ResultTranslator::call_hierarchy_item`]. Items we did not produce are
/// returned as they are.
pub fn engine_call_hierarchy_item(item: CallHierarchyItem) -> (Option<Url>, CallHierarchyItem) {
    let Some((virtual_uri, Some(original))) = unwrap_data(item.data.as_ref()) else {
        return (None, item);
    };
    match serde_json::from_value(original) {
        Ok(original) => (Some(virtual_uri), original),
        Err(_) => (None, item),
    }
}

fn contains(outer: Range, inner: Range) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

/// Combine workspace edits from several engine calls into one.
///
/// Text edits are kept per URI in call order; resource operations follow the
/// text edits of the call that produced them.
pub fn merge_workspace_edits(edits: Vec<WorkspaceEdit>) -> Option<WorkspaceEdit> {
    if edits.is_empty() {
        return None;
    }
    if edits.len() == 1 {
        return edits.into_iter().next();
    }

    let mut changes: HashMap<Uri, Vec<TextEdit>> = HashMap::new();
    let mut operations: Vec<DocumentChangeOperation> = Vec::new();
    for edit in edits {
        if let Some(edit_changes) = edit.changes {
            for (uri, text_edits) in edit_changes {
                changes.entry(uri).or_default().extend(text_edits);
            }
        }
        match edit.document_changes {
            Some(DocumentChanges::Edits(document_edits)) => {
                operations.extend(document_edits.into_iter().map(DocumentChangeOperation::Edit));
            }
            Some(DocumentChanges::Operations(ops)) => operations.extend(ops),
            None => {}
        }
    }

    Some(WorkspaceEdit {
        changes: (!changes.is_empty()).then_some(changes),
        document_changes: (!operations.is_empty()).then_some(DocumentChanges::Operations(operations)),
        ..Default::default()
    })
}
