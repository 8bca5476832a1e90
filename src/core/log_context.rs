//! Per-thread diagnostic context
//!
//! This module provides:
//! - `ThreadContext`: the calling thread's context map and context stack
//! - `ContextGuard`: RAII guard for a scoped map entry
//! - `StackGuard`: RAII guard for a scoped stack frame
//!
//! Events copy both structures when they are created, so later changes on
//! the thread never leak into an event that has already been published.

use std::cell::RefCell;
use std::collections::BTreeMap;

/// Key/value context attached to every event.
pub type ContextMap = BTreeMap<String, String>;

thread_local! {
    static CONTEXT_MAP: RefCell<ContextMap> = const { RefCell::new(BTreeMap::new()) };
    static CONTEXT_STACK: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Accessors for the current thread's diagnostic context.
///
/// # Example
///
/// ```
/// use rust_log_router::core::ThreadContext;
///
/// {
///     let _guard = ThreadContext::scoped("type", "Service");
///     assert_eq!(ThreadContext::get("type").as_deref(), Some("Service"));
/// }
/// assert_eq!(ThreadContext::get("type"), None);
/// ```
pub struct ThreadContext;

impl ThreadContext {
    pub fn put(key: impl Into<String>, value: impl Into<String>) {
        CONTEXT_MAP.with(|map| {
            map.borrow_mut().insert(key.into(), value.into());
        });
    }

    pub fn get(key: &str) -> Option<String> {
        CONTEXT_MAP.with(|map| map.borrow().get(key).cloned())
    }

    pub fn remove(key: &str) {
        CONTEXT_MAP.with(|map| {
            map.borrow_mut().remove(key);
        });
    }

    pub fn clear_map() {
        CONTEXT_MAP.with(|map| map.borrow_mut().clear());
    }

    /// Put a value that is removed again when the guard drops.
    #[must_use = "the entry is removed as soon as the guard is dropped"]
    pub fn scoped(key: impl Into<String>, value: impl Into<String>) -> ContextGuard {
        let key = key.into();
        let previous = CONTEXT_MAP.with(|map| map.borrow_mut().insert(key.clone(), value.into()));
        ContextGuard { key, previous }
    }

    pub fn push(message: impl Into<String>) {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(message.into()));
    }

    pub fn pop() -> Option<String> {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().pop())
    }

    pub fn peek() -> Option<String> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned())
    }

    pub fn clear_stack() {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().clear());
    }

    #[must_use = "the frame is popped as soon as the guard is dropped"]
    pub fn push_scoped(message: impl Into<String>) -> StackGuard {
        let depth = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(message.into());
            stack.len()
        });
        StackGuard { depth }
    }

    /// Copy of the context map.
    pub fn map_snapshot() -> ContextMap {
        CONTEXT_MAP.with(|map| map.borrow().clone())
    }

    /// Copy of the context stack, oldest first.
    pub fn stack_snapshot() -> Vec<String> {
        CONTEXT_STACK.with(|stack| stack.borrow().clone())
    }
}

/// RAII guard for a scoped context map entry
///
/// On drop the entry is removed, or restored to the value it replaced.
pub struct ContextGuard {
    key: String,
    previous: Option<String>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let key = std::mem::take(&mut self.key);
        let previous = self.previous.take();
        CONTEXT_MAP.with(|map| {
            let mut map = map.borrow_mut();
            match previous {
                Some(value) => map.insert(key, value),
                None => map.remove(&key),
            };
        });
    }
}

/// RAII guard for a scoped context stack frame
pub struct StackGuard {
    depth: usize,
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().truncate(self.depth.saturating_sub(1)));
    }
}
