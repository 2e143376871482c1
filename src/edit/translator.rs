use std::collections::{BTreeMap, HashMap};

use log::debug;
use tower_lsp_server::ls_types::{
    AnnotatedTextEdit, DocumentChangeOperation, DocumentChanges, OneOf,
    OptionalVersionedTextDocumentIdentifier, ResourceOp, TextDocumentEdit, TextEdit, Uri,
    WorkspaceEdit,
};
use url::Url;

use crate::document::{uri_to_url, url_to_uri};
use crate::embedding::{Capability, is_virtual_uri};
use crate::mapping::{MappingSource, RangeMapper, RegionOrder};
use crate::text::Span;

/// Host edits per host URI, in application order.
pub type HostEdits = BTreeMap<Url, Vec<TextEdit>>;

/// Where a translated edit came from; absent for pass-through edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOrigin {
    pub virtual_uri: Url,
    pub span: Span,
    /// Host length of the mapping that carried the edit.
    pub region_len: usize,
    pub order: RegionOrder,
}

/// An edit in host coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEdit {
    pub uri: Url,
    pub edit: TextEdit,
    pub origin: Option<EditOrigin>,
}

/// Translates engine edits expressed against virtual documents into host edits.
pub struct EditTranslator<'a, S: ?Sized> {
    mapper: RangeMapper<'a, S>,
    required: Option<Capability>,
}

impl<'a, S: MappingSource + ?Sized> EditTranslator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            mapper: RangeMapper::new(source),
            required: None,
        }
    }

    /// Only mappings granting `capability` may carry edits.
    pub fn with_capability(source: &'a S, capability: Capability) -> Self {
        Self {
            mapper: RangeMapper::new(source),
            required: Some(capability),
        }
    }

    /// Translate one edit of `uri`.
    ///
    /// Edits of virtual documents map only when exactly one distinct host range
    /// corresponds to them. Edits of tracked non-virtual documents pass through;
    /// anything else is dropped.
    pub fn translate(&self, edit: &TextEdit, uri: &Url) -> Option<HostEdit> {
        let source = self.mapper.source();
        if source.virtual_document(uri).is_none() {
            if is_virtual_uri(uri) || !source.is_tracked(uri) {
                debug!(target: "mosaic::edit", "skipping edit of unknown document {}", uri);
                return None;
            }
            return Some(HostEdit {
                uri: uri.clone(),
                edit: edit.clone(),
                origin: None,
            });
        }

        let mut candidates = self
            .mapper
            .to_host(uri, edit.range)
            .into_iter()
            .filter(|host| self.required.is_none_or(|cap| host.allows(cap)));
        let first = candidates.next();
        let Some(host) = first else {
            debug!(
                target: "mosaic::edit",
                "dropping edit at {:?} of {}: no single mapping contains it",
                edit.range,
                uri
            );
            return None;
        };
        if candidates.any(|other| other.span != host.span) {
            debug!(
                target: "mosaic::edit",
                "dropping edit at {:?} of {}: maps to several host ranges",
                edit.range,
                uri
            );
            return None;
        }

        Some(HostEdit {
            uri: host.host_uri,
            edit: TextEdit {
                range: host.range,
                new_text: edit.new_text.clone(),
            },
            origin: Some(EditOrigin {
                virtual_uri: uri.clone(),
                span: host.span,
                region_len: host.region_len,
                order: host.order,
            }),
        })
    }

    /// Translate and merge edits of several documents.
    ///
    /// Edits coming from different virtual documents that touch the same host
    /// bytes (or insert at the same offset) conflict: the one carried by the
    /// narrower mapping wins, ties go to the earlier region. Identical edits
    /// are kept once.
    pub fn translate_batch<I>(&self, files: I) -> HostEdits
    where
        I: IntoIterator<Item = (Url, Vec<TextEdit>)>,
    {
        let mut per_host: BTreeMap<Url, Vec<HostEdit>> = BTreeMap::new();
        for (uri, edits) in files {
            for edit in &edits {
                if let Some(host_edit) = self.translate(edit, &uri) {
                    per_host
                        .entry(host_edit.uri.clone())
                        .or_default()
                        .push(host_edit);
                }
            }
        }

        per_host
            .into_iter()
            .map(|(uri, edits)| {
                let merged = merge_host_edits(&uri, edits);
                (uri, merged)
            })
            .filter(|(_, edits)| !edits.is_empty())
            .collect()
    }

    /// Translate a workspace edit produced against virtual documents.
    ///
    /// Returns `None` when nothing survives translation. Resource operations
    /// naming a virtual document are dropped.
    pub fn translate_workspace_edit(&self, edit: WorkspaceEdit) -> Option<WorkspaceEdit> {
        let mut files: Vec<(Url, Vec<TextEdit>)> = Vec::new();
        let mut operations: Vec<ResourceOp> = Vec::new();

        if let Some(changes) = edit.changes {
            for (uri, edits) in changes {
                if let Some(url) = uri_to_url(&uri) {
                    files.push((url, edits));
                }
            }
        }

        match edit.document_changes {
            Some(DocumentChanges::Edits(edits)) => {
                for document_edit in edits {
                    collect_document_edit(document_edit, &mut files);
                }
            }
            Some(DocumentChanges::Operations(ops)) => {
                for op in ops {
                    match op {
                        DocumentChangeOperation::Edit(document_edit) => {
                            collect_document_edit(document_edit, &mut files);
                        }
                        DocumentChangeOperation::Op(resource_op) => {
                            if self.names_virtual_document(&resource_op) {
                                debug!(
                                    target: "mosaic::edit",
                                    "dropping resource operation on a virtual document: {:?}",
                                    resource_op
                                );
                            } else {
                                operations.push(resource_op);
                            }
                        }
                    }
                }
            }
            None => {}
        }

        let host_edits = self.translate_batch(files);
        build_workspace_edit(host_edits, operations)
    }

    fn names_virtual_document(&self, op: &ResourceOp) -> bool {
        let uris: Vec<&Uri> = match op {
            ResourceOp::Create(create) => vec![&create.uri],
            ResourceOp::Rename(rename) => vec![&rename.old_uri, &rename.new_uri],
            ResourceOp::Delete(delete) => vec![&delete.uri],
        };
        let source = self.mapper.source();
        uris.into_iter().any(|uri| {
            uri_to_url(uri).is_some_and(|url| {
                is_virtual_uri(&url) || source.virtual_document(&url).is_some()
            })
        })
    }
}

fn collect_document_edit(document_edit: TextDocumentEdit, files: &mut Vec<(Url, Vec<TextEdit>)>) {
    let Some(url) = uri_to_url(&document_edit.text_document.uri) else {
        return;
    };
    let edits = document_edit
        .edits
        .into_iter()
        .map(|edit| match edit {
            OneOf::Left(edit) => edit,
            OneOf::Right(AnnotatedTextEdit { text_edit, .. }) => text_edit,
        })
        .collect();
    files.push((url, edits));
}

fn build_workspace_edit(host_edits: HostEdits, operations: Vec<ResourceOp>) -> Option<WorkspaceEdit> {
    if host_edits.is_empty() && operations.is_empty() {
        return None;
    }

    if operations.is_empty() {
        let changes: HashMap<Uri, Vec<TextEdit>> = host_edits
            .into_iter()
            .filter_map(|(url, edits)| Some((url_to_uri(&url)?, edits)))
            .collect();
        return Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        });
    }

    // Resource operations first so edits target files that already exist.
    let mut document_changes: Vec<DocumentChangeOperation> = operations
        .into_iter()
        .map(DocumentChangeOperation::Op)
        .collect();
    for (url, edits) in host_edits {
        let Some(uri) = url_to_uri(&url) else {
            continue;
        };
        document_changes.push(DocumentChangeOperation::Edit(TextDocumentEdit {
            text_document: OptionalVersionedTextDocumentIdentifier { uri, version: None },
            edits: edits.into_iter().map(OneOf::Left).collect(),
        }));
    }
    Some(WorkspaceEdit {
        document_changes: Some(DocumentChanges::Operations(document_changes)),
        ..Default::default()
    })
}

/// Resolve conflicts among the edits of one host document.
fn merge_host_edits(uri: &Url, edits: Vec<HostEdit>) -> Vec<TextEdit> {
    let mut passthrough = Vec::new();
    let mut mapped: Vec<(usize, HostEdit)> = Vec::new();
    for (sequence, edit) in edits.into_iter().enumerate() {
        if edit.origin.is_some() {
            mapped.push((sequence, edit));
        } else {
            passthrough.push(edit.edit);
        }
    }

    // Priority: shorter carrying mapping (not the whole region), then region
    // order, then arrival.
    let mut by_priority: Vec<&(usize, HostEdit)> = mapped.iter().collect();
    by_priority.sort_by_key(|(sequence, edit)| {
        let origin = edit.origin.as_ref().map(|o| (o.region_len, o.order));
        (origin, *sequence)
    });

    let mut accepted: Vec<&(usize, HostEdit)> = Vec::new();
    for candidate in by_priority {
        let (_, edit) = candidate;
        let Some(origin) = edit.origin.as_ref() else {
            continue;
        };

        let mut keep = true;
        for (_, winner) in &accepted {
            let Some(winner_origin) = winner.origin.as_ref() else {
                continue;
            };
            if winner_origin.span == origin.span && winner.edit.new_text == edit.edit.new_text {
                keep = false;
                break;
            }
            // An engine's own batch for one document is already consistent.
            if winner_origin.virtual_uri == origin.virtual_uri {
                continue;
            }
            if winner_origin.span.conflicts_with(origin.span) {
                if winner_origin.region_len == origin.region_len {
                    debug!(
                        target: "mosaic::edit",
                        "ambiguous conflict in {} at {:?}: keeping edit from {}, dropping edit from {}",
                        uri,
                        origin.span,
                        winner_origin.virtual_uri,
                        origin.virtual_uri
                    );
                } else {
                    debug!(
                        target: "mosaic::edit",
                        "conflict in {} at {:?}: narrower region from {} wins",
                        uri,
                        origin.span,
                        winner_origin.virtual_uri
                    );
                }
                keep = false;
                break;
            }
        }
        if keep {
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|(sequence, edit)| {
        let span = edit.origin.as_ref().map(|o| o.span).unwrap_or_default();
        (span.start, span.end, *sequence)
    });
    accepted
        .into_iter()
        .map(|(_, edit)| edit.edit.clone())
        .chain(passthrough)
        .collect()
}
