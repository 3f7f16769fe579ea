//! Ordered collections of resolution levels.
//!
//! A pyramid is built once at load time, after a format driver has produced
//! one pixel source per resolution level, and is read-only thereafter. Level
//! 0 is always full resolution; every deeper level is a spatial downsampling
//! of the one above it with identical axis labels.

use tracing::debug;

use crate::error::PyramidError;
use crate::source::PixelSource;

/// Ordered sequence of resolution levels, full resolution first.
#[derive(Debug)]
pub struct Pyramid<S: PixelSource> {
    levels: Vec<S>,
}

impl<S: PixelSource> Pyramid<S> {
    /// Assemble a pyramid, validating the level invariants once.
    ///
    /// # Errors
    ///
    /// - [`PyramidError::Empty`] with no levels
    /// - [`PyramidError::LabelMismatch`] when a level's axis labels differ
    ///   from level 0's
    /// - [`PyramidError::NotDownsampled`] when a level's spatial extent
    ///   exceeds the previous level's
    pub fn new(levels: Vec<S>) -> Result<Self, PyramidError> {
        let base = levels.first().ok_or(PyramidError::Empty)?;
        let base_labels = base.labels();

        let mut prev_extent = base.image_extent();
        for (index, level) in levels.iter().enumerate().skip(1) {
            if level.labels() != base_labels {
                return Err(PyramidError::LabelMismatch {
                    level: index,
                    expected: base_labels.to_vec(),
                    got: level.labels().to_vec(),
                });
            }
            let extent = level.image_extent();
            if extent.0 > prev_extent.0 || extent.1 > prev_extent.1 {
                return Err(PyramidError::NotDownsampled {
                    level: index,
                    prev_width: prev_extent.0,
                    prev_height: prev_extent.1,
                    got_width: extent.0,
                    got_height: extent.1,
                });
            }
            prev_extent = extent;
        }

        debug!(levels = levels.len(), "pyramid assembled");
        Ok(Self { levels })
    }

    /// Number of resolution levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// The level at `index`, 0 = full resolution.
    pub fn level(&self, index: usize) -> Option<&S> {
        self.levels.get(index)
    }

    /// The full-resolution level.
    pub fn base(&self) -> &S {
        &self.levels[0]
    }

    /// The lowest-resolution level.
    pub fn coarsest(&self) -> &S {
        self.levels.last().expect("pyramid is never empty")
    }

    /// Iterate levels from full resolution down.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.levels.iter()
    }
}
