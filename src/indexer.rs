//! Mapping from logical axis selections to backend-native coordinates.
//!
//! Backends address data by a positional coordinate vector in their native
//! axis order; callers address it by label (`{channel: 2, z: 5}`) plus a
//! spatial position. The indexer is the pure function between the two. It
//! also decides where the spatial slots sit, which depends on whether the
//! trailing axis is an interleaved sample axis.

use crate::error::AccessError;
use crate::selection::Selection;

/// Spatial axis labels. Never required in a selection.
pub const X_LABEL: &str = "x";
pub const Y_LABEL: &str = "y";
pub const Z_LABEL: &str = "z";

/// Whether a shape's trailing axis is an interleaved sample axis.
///
/// Heuristic inherited from the formats this layer serves: a trailing extent
/// of at most 4 on a rank > 2 array is taken to be per-pixel samples (RGB or
/// RGBA) rather than a spatial axis. Declaring interleave explicitly in the
/// level descriptor would be sounder; until the metadata parsers provide
/// that, this is the single place the convention lives.
pub fn is_interleaved(shape: &[usize]) -> bool {
    shape.len() > 2 && shape.last().is_some_and(|&extent| extent <= 4)
}

/// Pure mapping from `(Selection, x?, y?)` to a native coordinate vector.
///
/// The returned vector always has the source's full rank. The x slot sits at
/// `rank - 1` for planar layouts and `rank - 2` for interleaved ones, with y
/// immediately before it; an interleaved trailing slot is pinned to 0. Every
/// other slot is copied from the selection by label.
#[derive(Debug, Clone)]
pub struct Indexer {
    labels: Vec<String>,
    shape: Vec<usize>,
    x_index: usize,
}

impl Indexer {
    /// Build an indexer for a source's labels and shape.
    ///
    /// # Panics
    /// Panics below rank 2; a source always has a y and an x axis, and
    /// descriptor validation rejects lower ranks before construction.
    pub fn new(labels: &[String], shape: &[usize]) -> Self {
        let rank = shape.len();
        assert!(rank >= 2, "indexer requires at least a y and an x axis");
        let x_index = rank - if is_interleaved(shape) { 2 } else { 1 };
        Self {
            labels: labels.to_vec(),
            shape: shape.to_vec(),
            x_index,
        }
    }

    /// Position of the x axis in the native coordinate vector.
    pub fn x_index(&self) -> usize {
        self.x_index
    }

    /// Position of the y axis in the native coordinate vector.
    pub fn y_index(&self) -> usize {
        self.x_index - 1
    }

    /// Labels of the axes a selection must pin: everything before y except
    /// `z`, which is a spatial axis and defaults to plane 0 when omitted.
    pub fn required_labels(&self) -> impl Iterator<Item = &str> {
        self.labels[..self.y_index()]
            .iter()
            .map(String::as_str)
            .filter(|&label| label != Z_LABEL)
    }

    /// Resolve a selection into a full-rank coordinate vector.
    ///
    /// `x` and `y` fill the spatial slots (0 when absent, for callers that
    /// overwrite them with ranges); an omitted `z` reads as plane 0. Fails
    /// with `SelectionIncomplete` when a required label is missing and
    /// `SelectionOutOfRange` when a supplied index is not within its axis
    /// extent.
    pub fn apply(
        &self,
        selection: &Selection,
        x: Option<usize>,
        y: Option<usize>,
    ) -> Result<Vec<usize>, AccessError> {
        let rank = self.shape.len();
        let mut coord = vec![0; rank];
        coord[self.x_index] = x.unwrap_or(0);
        coord[self.y_index()] = y.unwrap_or(0);

        for (i, label) in self.labels.iter().enumerate().take(self.y_index()) {
            let index = match selection.get(label) {
                Some(index) => index,
                None if label == Z_LABEL => 0,
                None => {
                    return Err(AccessError::SelectionIncomplete {
                        label: label.clone(),
                    })
                }
            };
            if index >= self.shape[i] {
                return Err(AccessError::SelectionOutOfRange {
                    label: label.clone(),
                    index,
                    extent: self.shape[i],
                });
            }
            coord[i] = index;
        }
        Ok(coord)
    }
}
