//! Filters of the older model
//!
//! Older-model filters form a singly linked chain: each node decides on its
//! own and points at the next node. The chain is evaluated front to back and
//! the first `Accept` or `Deny` wins.

use super::event::LoggingEvent;
use super::level::Level;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Decision {
    Deny = -1,
    Neutral = 0,
    Accept = 1,
}

pub trait Filter: Send + Sync {
    fn decide(&self, event: &dyn LoggingEvent) -> Decision;

    /// The following node of the chain.
    fn next(&self) -> Option<Arc<dyn Filter>> {
        None
    }

    /// The newer-model filter this value wraps, if any.
    fn modern_view(&self) -> Option<Arc<dyn crate::core::Filter>> {
        None
    }
}

/// Evaluate a whole chain starting at `head`.
pub fn decide_chain(head: &Arc<dyn Filter>, event: &dyn LoggingEvent) -> Decision {
    let mut current = Some(Arc::clone(head));
    while let Some(filter) = current {
        match filter.decide(event) {
            Decision::Neutral => current = filter.next(),
            decided => return decided,
        }
    }
    Decision::Neutral
}

/// Iterate the nodes of a chain.
pub fn chain_nodes(head: &Arc<dyn Filter>) -> Vec<Arc<dyn Filter>> {
    let mut nodes = Vec::new();
    let mut current = Some(Arc::clone(head));
    while let Some(filter) = current {
        current = filter.next();
        nodes.push(filter);
    }
    nodes
}

/// One node of a chain built by [`FilterChain`].
struct Link {
    filter: Arc<dyn Filter>,
    next: Option<Arc<dyn Filter>>,
}

impl Filter for Link {
    fn decide(&self, event: &dyn LoggingEvent) -> Decision {
        self.filter.decide(event)
    }

    fn next(&self) -> Option<Arc<dyn Filter>> {
        self.next.clone()
    }

    fn modern_view(&self) -> Option<Arc<dyn crate::core::Filter>> {
        self.filter.modern_view()
    }
}

/// Builds a linked chain from individual filters, keeping their order.
///
/// # Example
///
/// ```
/// use rust_log_router::legacy::{DenyAllFilter, FilterChain, Level, LevelMatchFilter};
/// use std::sync::Arc;
///
/// let head = FilterChain::new()
///     .then(Arc::new(LevelMatchFilter::new(Level::ERROR, true)))
///     .then(Arc::new(DenyAllFilter))
///     .build();
/// assert!(head.is_some());
/// ```
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The head of the chain, or `None` when empty.
    pub fn build(&self) -> Option<Arc<dyn Filter>> {
        let mut next: Option<Arc<dyn Filter>> = None;
        for filter in self.filters.iter().rev() {
            next = Some(Arc::new(Link {
                filter: Arc::clone(filter),
                next,
            }));
        }
        next
    }
}

/// Decides on events of exactly one level.
#[derive(Debug, Clone)]
pub struct LevelMatchFilter {
    level_to_match: Level,
    accept_on_match: bool,
}

impl LevelMatchFilter {
    pub fn new(level_to_match: Level, accept_on_match: bool) -> Self {
        Self {
            level_to_match,
            accept_on_match,
        }
    }
}

impl Filter for LevelMatchFilter {
    fn decide(&self, event: &dyn LoggingEvent) -> Decision {
        if event.level().to_int() != self.level_to_match.to_int() {
            Decision::Neutral
        } else if self.accept_on_match {
            Decision::Accept
        } else {
            Decision::Deny
        }
    }
}

/// Denies events outside `[min, max]`.
#[derive(Debug, Clone)]
pub struct LevelRangeFilter {
    level_min: Option<Level>,
    level_max: Option<Level>,
    accept_on_match: bool,
}

impl LevelRangeFilter {
    pub fn new(level_min: Option<Level>, level_max: Option<Level>, accept_on_match: bool) -> Self {
        Self {
            level_min,
            level_max,
            accept_on_match,
        }
    }
}

impl Filter for LevelRangeFilter {
    fn decide(&self, event: &dyn LoggingEvent) -> Decision {
        let level = event.level();
        if self.level_min.as_ref().is_some_and(|min| !level.is_greater_or_equal(min)) {
            return Decision::Deny;
        }
        if self.level_max.as_ref().is_some_and(|max| level.to_int() > max.to_int()) {
            return Decision::Deny;
        }
        if self.accept_on_match {
            Decision::Accept
        } else {
            Decision::Neutral
        }
    }
}

/// Decides on events whose message contains a string.
#[derive(Debug, Clone)]
pub struct StringMatchFilter {
    string_to_match: String,
    accept_on_match: bool,
}

impl StringMatchFilter {
    pub fn new(string_to_match: impl Into<String>, accept_on_match: bool) -> Self {
        Self {
            string_to_match: string_to_match.into(),
            accept_on_match,
        }
    }
}

impl Filter for StringMatchFilter {
    fn decide(&self, event: &dyn LoggingEvent) -> Decision {
        if self.string_to_match.is_empty()
            || !event.rendered_message().contains(&self.string_to_match)
        {
            Decision::Neutral
        } else if self.accept_on_match {
            Decision::Accept
        } else {
            Decision::Deny
        }
    }
}

/// Denies everything; usually the last node of a chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllFilter;

impl Filter for DenyAllFilter {
    fn decide(&self, _event: &dyn LoggingEvent) -> Decision {
        Decision::Deny
    }
}
