//! Layout adapters

use super::event::{LegacyEventView, ModernEventView};
use crate::core::{Layout, LogEvent};
use crate::legacy::{self, LoggingEvent};
use std::sync::Arc;

/// An older-model layout usable as a newer-model one.
///
/// Bytes are always produced by formatting to a string first; the older
/// model has no byte-level formatting to delegate to.
pub struct LayoutAdapter {
    layout: Arc<dyn legacy::Layout>,
}

impl LayoutAdapter {
    pub fn adapt(layout: Arc<dyn legacy::Layout>) -> Arc<dyn Layout> {
        match layout.modern_view() {
            Some(original) => original,
            None => Arc::new(LayoutAdapter { layout }),
        }
    }

    pub fn inner(&self) -> &Arc<dyn legacy::Layout> {
        &self.layout
    }
}

impl Layout for LayoutAdapter {
    fn format(&self, event: &dyn LogEvent) -> String {
        let view = LegacyEventView::of(event);
        self.layout.format(&*view)
    }

    fn to_byte_array(&self, event: &dyn LogEvent) -> Vec<u8> {
        self.format(event).into_bytes()
    }

    fn header(&self) -> Option<Vec<u8>> {
        self.layout.header().map(String::into_bytes)
    }

    fn footer(&self) -> Option<Vec<u8>> {
        self.layout.footer().map(String::into_bytes)
    }

    fn content_type(&self) -> &str {
        self.layout.content_type()
    }

    fn legacy_view(&self) -> Option<Arc<dyn legacy::Layout>> {
        Some(Arc::clone(&self.layout))
    }
}

/// A newer-model layout usable as an older-model one.
pub struct LayoutWrapper {
    layout: Arc<dyn Layout>,
}

impl LayoutWrapper {
    pub fn wrap(layout: Arc<dyn Layout>) -> Arc<dyn legacy::Layout> {
        match layout.legacy_view() {
            Some(original) => original,
            None => Arc::new(LayoutWrapper { layout }),
        }
    }

    pub fn inner(&self) -> &Arc<dyn Layout> {
        &self.layout
    }
}

impl legacy::Layout for LayoutWrapper {
    fn format(&self, event: &dyn LoggingEvent) -> String {
        let view = ModernEventView::of(event);
        self.layout.format(&*view)
    }

    fn content_type(&self) -> &str {
        self.layout.content_type()
    }

    fn header(&self) -> Option<String> {
        self.layout
            .header()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    fn footer(&self) -> Option<String> {
        self.layout
            .footer()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    fn ignores_throwable(&self) -> bool {
        false
    }

    fn modern_view(&self) -> Option<Arc<dyn Layout>> {
        Some(Arc::clone(&self.layout))
    }
}
