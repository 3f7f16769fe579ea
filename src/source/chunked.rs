//! Pixel source over a regularly chunked array store.

use std::ops::Range;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::driver::ChunkStore;
use crate::dtype::Dtype;
use crate::error::{AccessError, InvalidDescriptor, TileError};
use crate::geometry::{PixelWindow, TileGrid};
use crate::indexer::Indexer;
use crate::meta::{LevelDescriptor, SourceMeta};
use crate::selection::Selection;
use crate::source::{PixelSource, Raster};

/// One resolution level backed by a chunked array store.
///
/// Tile reads take one of two paths that are numerically identical for the
/// same window: a direct chunk read when the requested window coincides with
/// exactly one native chunk, and a ranged read across the array otherwise
/// (ragged edges, tile sizes that differ from the chunk size, misaligned
/// grids).
#[derive(Debug)]
pub struct ChunkedPixelSource<C: ChunkStore> {
    store: C,
    labels: Vec<String>,
    tile_size: Option<u32>,
    meta: Option<SourceMeta>,
    indexer: Indexer,
}

impl<C: ChunkStore> ChunkedPixelSource<C> {
    /// Build a level from a store and its normalized descriptor.
    ///
    /// The descriptor must agree with the store on shape and dtype; its
    /// `tile_size` overrides the default grid, which is the store's spatial
    /// chunk extent.
    pub fn new(store: C, descriptor: &LevelDescriptor) -> Result<Self, InvalidDescriptor> {
        if !descriptor.is_consistent() {
            return Err(InvalidDescriptor {
                reason: format!(
                    "labels {:?} do not describe shape {:?}",
                    descriptor.labels, descriptor.shape
                ),
            });
        }
        if descriptor.shape != store.shape() {
            return Err(InvalidDescriptor {
                reason: format!(
                    "descriptor shape {:?} does not match store shape {:?}",
                    descriptor.shape,
                    store.shape()
                ),
            });
        }
        if descriptor.dtype != store.dtype() {
            return Err(InvalidDescriptor {
                reason: format!(
                    "descriptor dtype {:?} does not match store dtype {:?}",
                    descriptor.dtype,
                    store.dtype()
                ),
            });
        }

        let indexer = Indexer::new(&descriptor.labels, &descriptor.shape);
        let tile_size = descriptor
            .tile_size
            .or_else(|| Some(store.chunk_shape()[indexer.x_index()] as u32));
        Ok(Self {
            store,
            labels: descriptor.labels.clone(),
            tile_size,
            meta: descriptor.meta.clone(),
            indexer,
        })
    }

    /// The tiling grid for this level.
    fn grid(&self) -> TileGrid {
        let (width, height) = self.image_extent();
        let tile = self
            .tile_size
            .map(|t| t as usize)
            // An untiled level serves its whole extent as a single cell.
            .unwrap_or_else(|| width.max(height));
        TileGrid::new(width, height, tile)
    }

    /// Per-axis ranges selecting `window` within the plane of `selection`.
    fn window_ranges(
        &self,
        selection: &Selection,
        window: &PixelWindow,
    ) -> Result<Vec<Range<usize>>, AccessError> {
        let coord = self.indexer.apply(selection, None, None)?;
        let shape = self.store.shape();
        let x_index = self.indexer.x_index();
        let y_index = self.indexer.y_index();

        let ranges = coord
            .iter()
            .enumerate()
            .map(|(axis, &c)| {
                if axis == x_index {
                    window.x..window.x + window.width
                } else if axis == y_index {
                    window.y..window.y + window.height
                } else if axis > x_index {
                    // Interleaved sample axis rides along in full.
                    0..shape[axis]
                } else {
                    c..c + 1
                }
            })
            .collect();
        Ok(ranges)
    }

    /// Whether `window` coincides with exactly one native chunk, making the
    /// selection's chunk coordinate addressable directly.
    ///
    /// Requires spatial alignment and extent match, plus non-spatial chunk
    /// extents of 1 (so one chunk never spans several planes) and a trailing
    /// sample axis stored whole within a chunk.
    fn is_native_chunk_window(&self, window: &PixelWindow) -> bool {
        let chunks = self.store.chunk_shape();
        let shape = self.store.shape();
        let x_index = self.indexer.x_index();
        let y_index = self.indexer.y_index();

        window.width == chunks[x_index]
            && window.height == chunks[y_index]
            && window.x % chunks[x_index] == 0
            && window.y % chunks[y_index] == 0
            && (0..y_index).all(|axis| chunks[axis] == 1)
            && (x_index + 1..shape.len()).all(|axis| chunks[axis] == shape[axis])
    }

    async fn fetch_window(
        &self,
        selection: &Selection,
        window: &PixelWindow,
        x: u32,
        y: u32,
    ) -> Result<Raster, TileError> {
        let data = if self.is_native_chunk_window(window) {
            trace!(x, y, "tile window matches native chunk, reading directly");
            let chunks = self.store.chunk_shape();
            let chunk_x = window.x / chunks[self.indexer.x_index()];
            let chunk_y = window.y / chunks[self.indexer.y_index()];
            let coord = self.indexer.apply(selection, Some(chunk_x), Some(chunk_y))?;
            self.store.read_chunk(&coord).await.map_err(AccessError::from)?
        } else {
            trace!(x, y, "tile window read as array slice");
            let ranges = self.window_ranges(selection, window)?;
            self.store.read_window(&ranges).await.map_err(AccessError::from)?
        };
        Ok(Raster {
            data,
            width: window.width as u32,
            height: window.height as u32,
        })
    }

    /// The underlying chunk store.
    pub fn store(&self) -> &C {
        &self.store
    }
}

#[async_trait]
impl<C: ChunkStore> PixelSource for ChunkedPixelSource<C> {
    fn dtype(&self) -> Dtype {
        self.store.dtype()
    }

    fn shape(&self) -> &[usize] {
        self.store.shape()
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn tile_size(&self) -> Option<u32> {
        self.tile_size
    }

    fn meta(&self) -> Option<&SourceMeta> {
        self.meta.as_ref()
    }

    async fn get_raster(&self, selection: &Selection) -> Result<Raster, AccessError> {
        let (width, height) = self.image_extent();
        let window = PixelWindow {
            x: 0,
            y: 0,
            width,
            height,
        };
        let ranges = self.window_ranges(selection, &window)?;
        debug!(width, height, "reading full plane from chunk store");
        let data = self.store.read_window(&ranges).await?;
        Ok(Raster {
            data,
            width: width as u32,
            height: height as u32,
        })
    }

    async fn get_tile(
        &self,
        x: u32,
        y: u32,
        selection: &Selection,
        cancel: Option<&CancellationToken>,
    ) -> Result<Raster, TileError> {
        let grid = self.grid();
        let window = grid
            .window(x as usize, y as usize)
            .ok_or_else(|| TileError::OutOfBounds {
                x,
                y,
                tiles_x: grid.tiles_x() as u32,
                tiles_y: grid.tiles_y() as u32,
            })?;

        let fetch = self.fetch_window(selection, &window, x, y);
        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => Err(TileError::Cancelled),
                    result = fetch => result,
                }
            }
            None => fetch.await,
        }
    }
}
