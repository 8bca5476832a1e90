//! Error handler adapter

use super::event::LegacyEventView;
use crate::core::{ErrorHandler, LogEvent, Thrown};
use crate::legacy::{self, error_handler::GENERIC_FAILURE};
use std::sync::Arc;

/// An older-model error handler receiving newer-model reports.
///
/// Every report is sent with [`GENERIC_FAILURE`]. The older signature only
/// carries exceptions, so a thrown value of kind `Error` is dropped and the
/// report degrades to the message alone.
pub struct ErrorHandlerAdapter {
    handler: Arc<dyn legacy::ErrorHandler>,
}

impl ErrorHandlerAdapter {
    pub fn new(handler: Arc<dyn legacy::ErrorHandler>) -> Self {
        Self { handler }
    }

    pub fn inner(&self) -> &Arc<dyn legacy::ErrorHandler> {
        &self.handler
    }
}

impl ErrorHandler for ErrorHandlerAdapter {
    fn error(&self, message: &str) {
        self.handler.error(message);
    }

    fn error_with_thrown(&self, message: &str, thrown: &Thrown) {
        if thrown.is_exception() {
            self.handler
                .error_with(message, Some(thrown), GENERIC_FAILURE, None);
        } else {
            self.handler.error(message);
        }
    }

    fn error_with_event(&self, message: &str, event: &dyn LogEvent, thrown: Option<&Thrown>) {
        match thrown {
            Some(thrown) if !thrown.is_exception() => self.handler.error(message),
            _ => {
                let view = LegacyEventView::of(event);
                self.handler
                    .error_with(message, thrown, GENERIC_FAILURE, Some(&*view));
            }
        }
    }
}
