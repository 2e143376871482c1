use log::debug;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{
    CallHierarchyIncomingCall, CallHierarchyItem, CallHierarchyOutgoingCall, Position,
};
use url::Url;

use super::point;
use crate::dispatch::translate::engine_call_hierarchy_item;
use crate::dispatch::{DispatchSource, FanOut, FeatureDispatcher, ResultTranslator};
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::{FeatureResult, RequestCancelled};

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Call hierarchy items at `position`, from the first region that has any.
    pub fn prepare_call_hierarchy(
        &self,
        host_uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CallHierarchyItem>> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch(
            host_uri,
            point(position),
            Capability::CallHierarchy,
            FanOut::FirstNonEmpty,
            cancel,
            |engine, document, region| {
                let items = engine.prepare_call_hierarchy(document, region.virtual_range.start)?;
                Ok(items
                    .into_iter()
                    .filter_map(|item| translator.call_hierarchy_item(item))
                    .collect::<Vec<_>>())
            },
        )?;
        Ok(contributions
            .into_iter()
            .next()
            .map(|contribution| contribution.value)
            .unwrap_or_default())
    }

    /// Callers of an item produced by [`Self::prepare_call_hierarchy`].
    ///
    /// A caller is dropped when it, or every one of its call sites, does not
    /// map.
    pub fn incoming_calls(
        &self,
        item: CallHierarchyItem,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CallHierarchyIncomingCall>> {
        let Some(request) = self.call_hierarchy_request(item, cancel)? else {
            return Ok(Vec::new());
        };
        let calls = self.engine().incoming_calls(&request).unwrap_or_else(|e| {
            debug!(target: "mosaic::dispatch", "incoming calls of {} failed: {}", request.name, e);
            Vec::new()
        });
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }

        let translator = ResultTranslator::new(self.source());
        Ok(calls
            .into_iter()
            .filter_map(|call| {
                let from_ranges = translator.call_ranges(&call.from.uri, call.from_ranges);
                if from_ranges.is_empty() {
                    return None;
                }
                Some(CallHierarchyIncomingCall {
                    from: translator.call_hierarchy_item(call.from)?,
                    from_ranges,
                })
            })
            .collect())
    }

    /// Callees of an item produced by [`Self::prepare_call_hierarchy`].
    ///
    /// Call sites lie in the requested item's document; callees whose call
    /// sites all sit on scaffolding are dropped.
    pub fn outgoing_calls(
        &self,
        item: CallHierarchyItem,
        cancel: &CancellationToken,
    ) -> FeatureResult<Vec<CallHierarchyOutgoingCall>> {
        let Some(request) = self.call_hierarchy_request(item, cancel)? else {
            return Ok(Vec::new());
        };
        let calls = self.engine().outgoing_calls(&request).unwrap_or_else(|e| {
            debug!(target: "mosaic::dispatch", "outgoing calls of {} failed: {}", request.name, e);
            Vec::new()
        });
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }

        let translator = ResultTranslator::new(self.source());
        Ok(calls
            .into_iter()
            .filter_map(|call| {
                let from_ranges = translator.call_ranges(&request.uri, call.from_ranges);
                if from_ranges.is_empty() {
                    return None;
                }
                Some(CallHierarchyOutgoingCall {
                    to: translator.call_hierarchy_item(call.to)?,
                    from_ranges,
                })
            })
            .collect())
    }

    /// The item as the engine first reported it, or `None` when its virtual
    /// document no longer exists.
    fn call_hierarchy_request(
        &self,
        item: CallHierarchyItem,
        cancel: &CancellationToken,
    ) -> FeatureResult<Option<CallHierarchyItem>> {
        if cancel.is_cancelled() {
            return Err(RequestCancelled);
        }
        let (virtual_uri, request) = engine_call_hierarchy_item(item);
        if let Some(virtual_uri) = virtual_uri
            && self.source().valid_document(&virtual_uri).is_none()
        {
            debug!(target: "mosaic::dispatch", "{} is gone, no call hierarchy", virtual_uri);
            return Ok(None);
        }
        Ok(Some(request))
    }
}
