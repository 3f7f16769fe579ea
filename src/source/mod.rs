//! The PixelSource contract and its two variants.
//!
//! A `PixelSource` is one resolution level of one image, queryable three
//! ways: a full plane (`get_raster`), one tile of the level's grid
//! (`get_tile`), or a z-stack assembled from planes (`get_volume`). The two
//! variants cover the two storage geometries this layer reconciles:
//!
//! - [`ChunkedPixelSource`] over a regularly chunked array store
//! - [`DirectoryPixelSource`] over a directory-of-pages container
//!
//! Both are immutable after construction and share no state; everything
//! backend-specific stays local to its variant.

mod chunked;
mod directory;

pub use chunked::ChunkedPixelSource;
pub use directory::DirectoryPixelSource;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::dtype::Dtype;
use crate::error::{AccessError, TileError};
use crate::indexer::is_interleaved;
use crate::meta::SourceMeta;
use crate::selection::Selection;
use crate::volume::{assemble_volume, ProgressSender, Volume};

// =============================================================================
// Raster
// =============================================================================

/// One fetched 2-D window of pixels: a full plane or a (possibly ragged) tile.
///
/// Invariant: `data.len() == width * height * samples_per_pixel * dtype.size()`
/// for the owning source's dtype and layout. Rows are row-major,
/// top-to-bottom, exactly as the backend delivered them; orientation
/// reconciliation happens only in volume assembly.
#[derive(Debug, Clone)]
pub struct Raster {
    /// Raw element bytes
    pub data: Bytes,
    /// Width in pixels (> 0 for any valid result)
    pub width: u32,
    /// Height in pixels (> 0 for any valid result)
    pub height: u32,
}

// =============================================================================
// PixelSource
// =============================================================================

/// Uniform access contract over one resolution level.
///
/// Implementations resolve 2-D requests directly against their backend and
/// delegate 3-D requests to the volume assembly engine, which in turn issues
/// per-plane `get_raster` calls back into the source.
#[async_trait]
pub trait PixelSource: Send + Sync {
    /// Element kind of the stored pixels.
    fn dtype(&self) -> Dtype;

    /// Per-axis extents in native axis order.
    fn shape(&self) -> &[usize];

    /// Per-axis labels, same length and order as `shape`.
    fn labels(&self) -> &[String];

    /// Nominal tile size, or `None` for an untiled level.
    fn tile_size(&self) -> Option<u32>;

    /// Physical size metadata, when the format records it.
    fn meta(&self) -> Option<&SourceMeta>;

    /// Fetch the full plane for a selection.
    async fn get_raster(&self, selection: &Selection) -> Result<Raster, AccessError>;

    /// Fetch one grid cell, `x`/`y` in tile units.
    ///
    /// A cell clipped by the image boundary returns its ragged remainder. A
    /// cell entirely off the grid fails with [`TileError::OutOfBounds`]. A
    /// triggered cancellation token fails with [`TileError::Cancelled`]
    /// without partial writes.
    async fn get_tile(
        &self,
        x: u32,
        y: u32,
        selection: &Selection,
        cancel: Option<&CancellationToken>,
    ) -> Result<Raster, TileError>;

    /// Assemble a z-stack from per-plane fetches.
    ///
    /// `selection` must pin every non-spatial axis and leave `z` unset; the
    /// engine sweeps `z` at `depth_downsample` stride. See [`crate::volume`]
    /// for the progress and orientation contract.
    async fn get_volume(
        &self,
        selection: &Selection,
        progress: Option<ProgressSender>,
        depth_downsample: usize,
    ) -> Result<Volume, AccessError>
    where
        Self: Sized,
    {
        assemble_volume(self, selection, progress.as_ref(), depth_downsample).await
    }

    /// Index of a labeled axis in the native order.
    fn axis_index(&self, label: &str) -> Option<usize> {
        self.labels().iter().position(|l| l == label)
    }

    /// `(width, height)` of this level's pixel plane.
    ///
    /// Honors interleaved layouts, where the spatial axes sit one slot in
    /// from the end of the shape.
    fn image_extent(&self) -> (usize, usize) {
        let shape = self.shape();
        let x_index = shape.len() - if is_interleaved(shape) { 2 } else { 1 };
        (shape[x_index], shape[x_index - 1])
    }

    /// Samples per pixel: the trailing-axis extent for interleaved layouts,
    /// 1 otherwise.
    fn samples_per_pixel(&self) -> usize {
        let shape = self.shape();
        if is_interleaved(shape) {
            *shape.last().expect("interleaved shape is non-empty")
        } else {
            1
        }
    }
}
