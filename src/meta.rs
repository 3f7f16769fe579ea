//! Normalized per-level descriptors.
//!
//! Parsing format metadata (zarr attributes, embedded XML description blocks,
//! ...) is a collaborator's job. Whatever the format, the parser hands this
//! core one normalized record per resolution level; sources are constructed
//! from these records once at load time and never mutated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::dtype::Dtype;

/// Physical size of one pixel along one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSize {
    /// Size of one pixel in `unit`
    pub size: f64,
    /// Unit name, e.g. "µm"
    pub unit: String,
}

/// Optional per-level physical metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMeta {
    /// Physical pixel sizes keyed by axis label
    #[serde(default)]
    pub physical_sizes: HashMap<String, PhysicalSize>,
}

/// One resolution level, as normalized by an external metadata parser.
///
/// `labels` names every axis of `shape` in native order; the spatial axes are
/// labeled `x` and `y` (optionally `z`), and an interleaved trailing sample
/// axis keeps whatever label the parser gave it (it is never selectable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Element kind of the stored pixels
    pub dtype: Dtype,

    /// Per-axis extents in native axis order
    pub shape: Vec<usize>,

    /// Per-axis labels, same length and order as `shape`
    pub labels: Vec<String>,

    /// Nominal tile size in pixels, absent for untiled levels
    #[serde(default)]
    pub tile_size: Option<u32>,

    /// Physical size metadata, when the format records it
    #[serde(default)]
    pub meta: Option<SourceMeta>,
}

impl LevelDescriptor {
    /// Whether labels and shape are mutually consistent.
    ///
    /// A level needs at least a y and an x axis, every extent positive, and
    /// one label per axis. Construction of a pixel source requires this; the
    /// parser is trusted but cheap to double-check at the one place records
    /// enter the core.
    pub fn is_consistent(&self) -> bool {
        self.labels.len() == self.shape.len()
            && self.shape.len() >= 2
            && self.shape.iter().all(|&extent| extent > 0)
    }
}
