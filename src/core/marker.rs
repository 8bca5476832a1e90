//! Hierarchical markers attached to events

use std::fmt;
use std::sync::Arc;

/// A named tag that may declare parent markers.
///
/// Cloning is cheap; markers are compared by name.
#[derive(Clone)]
pub struct Marker {
    inner: Arc<MarkerInner>,
}

struct MarkerInner {
    name: String,
    parents: Vec<Marker>,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(MarkerInner {
                name: name.into(),
                parents: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub fn with_parent(self, parent: Marker) -> Self {
        let mut parents = self.inner.parents.clone();
        parents.push(parent);
        Self {
            inner: Arc::new(MarkerInner {
                name: self.inner.name.clone(),
                parents,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parents(&self) -> &[Marker] {
        &self.inner.parents
    }

    /// True if this marker or any ancestor carries `name`.
    pub fn is_instance_of(&self, name: &str) -> bool {
        self.inner.name == name || self.inner.parents.iter().any(|p| p.is_instance_of(name))
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
    }
}

impl Eq for Marker {}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)?;
        if !self.inner.parents.is_empty() {
            f.write_str("[ ")?;
            for (i, parent) in self.inner.parents.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", parent)?;
            }
            f.write_str(" ]")?;
        }
        Ok(())
    }
}
