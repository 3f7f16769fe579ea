//! Axis selections identifying one 2-D plane of a source.
//!
//! A selection pins every non-spatial axis (channel, time, ...) to one
//! index; the spatial axes are supplied by the operation itself (a tile
//! coordinate, a pixel window, or "the whole plane"). `z` may be pinned to
//! pick a plane of a stack and defaults to 0 when omitted; volume requests
//! leave it unset and let the assembly engine sweep it.

use std::collections::BTreeMap;

/// Mapping from non-spatial axis label to an index along that axis.
///
/// Backed by an ordered map so iteration (and anything keyed off it, like
/// directory page flattening) is deterministic.
///
/// # Example
///
/// ```
/// use rasterstack::Selection;
///
/// let sel = Selection::new().with("channel", 2).with("time", 0);
/// assert_eq!(sel.get("channel"), Some(2));
/// assert_eq!(sel.get("z"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    axes: BTreeMap<String, usize>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, label: impl Into<String>, index: usize) -> Self {
        self.axes.insert(label.into(), index);
        self
    }

    /// Set an axis index in place.
    pub fn set(&mut self, label: impl Into<String>, index: usize) {
        self.axes.insert(label.into(), index);
    }

    /// Get the index for an axis, if set.
    pub fn get(&self, label: &str) -> Option<usize> {
        self.axes.get(label).copied()
    }

    /// Whether the selection pins the given axis.
    pub fn contains(&self, label: &str) -> bool {
        self.axes.contains_key(label)
    }

    /// Number of pinned axes.
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// True when no axes are pinned.
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Iterate over (label, index) pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.axes.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<L: Into<String>> FromIterator<(L, usize)> for Selection {
    fn from_iter<T: IntoIterator<Item = (L, usize)>>(iter: T) -> Self {
        Self {
            axes: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
