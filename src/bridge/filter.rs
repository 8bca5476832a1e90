//! Filter adapters
//!
//! An older-model chain is flattened into one [`CompositeFilter`] whose
//! members keep the chain order, so first-match-wins evaluation gives the
//! same answer on both sides.

use super::event::{LegacyEventView, ModernEventView};
use crate::core::{CompositeFilter, Filter, FilterResult, LogEvent};
use crate::legacy::{self, chain_nodes, Decision, LoggingEvent};
use std::sync::Arc;

pub(crate) fn to_result(decision: Decision) -> FilterResult {
    match decision {
        Decision::Accept => FilterResult::Accept,
        Decision::Deny => FilterResult::Deny,
        Decision::Neutral => FilterResult::Neutral,
    }
}

pub(crate) fn to_decision(result: FilterResult) -> Decision {
    match result {
        FilterResult::Accept => Decision::Accept,
        FilterResult::Deny => Decision::Deny,
        FilterResult::Neutral => Decision::Neutral,
    }
}

/// One older-model chain node usable as a newer-model filter.
pub struct FilterAdapter {
    filter: Arc<dyn legacy::Filter>,
}

impl FilterAdapter {
    /// Flatten the chain starting at `head`.
    ///
    /// Nodes wrapping newer-model filters are unwrapped. A single-node chain
    /// yields that node's filter directly instead of a composite.
    pub fn adapt(head: Arc<dyn legacy::Filter>) -> Arc<dyn Filter> {
        let mut filters: Vec<Arc<dyn Filter>> = chain_nodes(&head)
            .into_iter()
            .map(|node| match node.modern_view() {
                Some(original) => original,
                None => Arc::new(FilterAdapter { filter: node }) as Arc<dyn Filter>,
            })
            .collect();

        if filters.len() == 1 {
            if let Some(single) = filters.pop() {
                return single;
            }
        }
        Arc::new(CompositeFilter::new(filters))
    }

    pub fn inner(&self) -> &Arc<dyn legacy::Filter> {
        &self.filter
    }
}

impl Filter for FilterAdapter {
    fn filter(&self, event: &dyn LogEvent) -> FilterResult {
        let view = LegacyEventView::of(event);
        to_result(self.filter.decide(&*view))
    }

    fn legacy_view(&self) -> Option<Arc<dyn legacy::Filter>> {
        Some(Arc::clone(&self.filter))
    }
}

/// A newer-model filter usable as a single older-model chain node.
pub struct FilterWrapper {
    filter: Arc<dyn Filter>,
}

impl FilterWrapper {
    pub fn wrap(filter: Arc<dyn Filter>) -> Arc<dyn legacy::Filter> {
        match filter.legacy_view() {
            Some(original) => original,
            None => Arc::new(FilterWrapper { filter }),
        }
    }

    pub fn inner(&self) -> &Arc<dyn Filter> {
        &self.filter
    }
}

impl legacy::Filter for FilterWrapper {
    fn decide(&self, event: &dyn LoggingEvent) -> Decision {
        let view = ModernEventView::of(event);
        to_decision(self.filter.filter(&*view))
    }

    fn modern_view(&self) -> Option<Arc<dyn Filter>> {
        Some(Arc::clone(&self.filter))
    }
}
