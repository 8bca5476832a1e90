//! Rewrite policy adapters

use super::event::{EventAdapter, EventWrapper, LegacyEventView, ModernEventView};
use crate::core::{LogEntry, LogEvent, RewritePolicy};
use crate::legacy::{self, LegacyEvent, LoggingEvent};
use std::sync::Arc;

/// An older-model rewrite policy usable as a newer-model one.
pub struct RewritePolicyAdapter {
    policy: Arc<dyn legacy::RewritePolicy>,
}

impl RewritePolicyAdapter {
    pub fn adapt(policy: Arc<dyn legacy::RewritePolicy>) -> Arc<dyn RewritePolicy> {
        match policy.modern_view() {
            Some(original) => original,
            None => Arc::new(RewritePolicyAdapter { policy }),
        }
    }

    pub fn inner(&self) -> &Arc<dyn legacy::RewritePolicy> {
        &self.policy
    }
}

impl RewritePolicy for RewritePolicyAdapter {
    fn rewrite(&self, source: &dyn LogEvent) -> Option<LogEntry> {
        let view = LegacyEventView::of(source);
        let rewritten = self.policy.rewrite(&*view)?;
        let mut entry = LogEntry::copy_from(&EventWrapper::new(&rewritten));
        // Fields the older model cannot carry are taken from the source.
        if rewritten.thread_name() == view.thread_name() {
            entry = entry.with_thread(
                source.thread_name().map(String::from),
                source.thread_id(),
            );
        }
        if let Some(marker) = source.marker() {
            entry = entry.with_marker(marker.clone());
        }
        if rewritten.time_stamp() == source.timestamp().epoch_millis() {
            entry = entry.with_timestamp(source.timestamp());
        }
        Some(entry)
    }

    fn legacy_view(&self) -> Option<Arc<dyn legacy::RewritePolicy>> {
        Some(Arc::clone(&self.policy))
    }
}

/// A newer-model rewrite policy usable as an older-model one.
pub struct RewritePolicyWrapper {
    policy: Arc<dyn RewritePolicy>,
}

impl RewritePolicyWrapper {
    pub fn wrap(policy: Arc<dyn RewritePolicy>) -> Arc<dyn legacy::RewritePolicy> {
        match policy.legacy_view() {
            Some(original) => original,
            None => Arc::new(RewritePolicyWrapper { policy }),
        }
    }

    pub fn inner(&self) -> &Arc<dyn RewritePolicy> {
        &self.policy
    }
}

impl legacy::RewritePolicy for RewritePolicyWrapper {
    fn rewrite(&self, source: &dyn LoggingEvent) -> Option<LegacyEvent> {
        let view = ModernEventView::of(source);
        let rewritten = self.policy.rewrite(&*view)?;
        Some(LegacyEvent::copy_from(&EventAdapter::new(&rewritten)))
    }

    fn modern_view(&self) -> Option<Arc<dyn RewritePolicy>> {
        Some(Arc::clone(&self.policy))
    }
}
