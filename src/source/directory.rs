//! Pixel source over a directory-of-pages container.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::driver::PageDriver;
use crate::dtype::Dtype;
use crate::error::{AccessError, InvalidDescriptor, TileError};
use crate::geometry::{PixelWindow, TileGrid};
use crate::indexer::Indexer;
use crate::meta::{LevelDescriptor, SourceMeta};
use crate::selection::Selection;
use crate::source::{PixelSource, Raster};

/// Default capacity of the page-offset cache, in pages.
///
/// Sized for typical containers (channels x timepoints x depth); eviction
/// just re-walks the offset index, so an undersized cache is slow, not wrong.
const DEFAULT_OFFSET_CACHE_CAPACITY: usize = 1024;

/// One resolution level backed by a directory of independently addressable
/// 2-D pages.
///
/// Each distinct non-spatial selection maps to one page by row-major
/// flattening of its coordinates. The first access to a page resolves its
/// byte offset through the driver's offset index; the result is cached so the
/// walk happens once per page.
pub struct DirectoryPixelSource<D: PageDriver> {
    driver: D,
    dtype: Dtype,
    shape: Vec<usize>,
    labels: Vec<String>,
    tile_size: Option<u32>,
    meta: Option<SourceMeta>,
    indexer: Indexer,
    offsets: RwLock<LruCache<usize, u64>>,
}

impl<D: PageDriver> DirectoryPixelSource<D> {
    /// Build a level from a page driver and its normalized descriptor.
    ///
    /// The descriptor must be internally consistent and must not describe
    /// more planes than the container has pages.
    pub fn new(driver: D, descriptor: &LevelDescriptor) -> Result<Self, InvalidDescriptor> {
        Self::with_offset_cache_capacity(driver, descriptor, DEFAULT_OFFSET_CACHE_CAPACITY)
    }

    /// Like [`new`](Self::new), with a custom page-offset cache capacity.
    pub fn with_offset_cache_capacity(
        driver: D,
        descriptor: &LevelDescriptor,
        offset_cache_capacity: usize,
    ) -> Result<Self, InvalidDescriptor> {
        if !descriptor.is_consistent() {
            return Err(InvalidDescriptor {
                reason: format!(
                    "labels {:?} do not describe shape {:?}",
                    descriptor.labels, descriptor.shape
                ),
            });
        }
        let indexer = Indexer::new(&descriptor.labels, &descriptor.shape);
        let planes: usize = descriptor.shape[..indexer.y_index()].iter().product();
        if planes > driver.page_count() {
            return Err(InvalidDescriptor {
                reason: format!(
                    "shape {:?} describes {} planes but the container has {} pages",
                    descriptor.shape,
                    planes,
                    driver.page_count()
                ),
            });
        }
        let capacity = NonZeroUsize::new(offset_cache_capacity.max(1))
            .expect("capacity is clamped to at least 1");
        Ok(Self {
            driver,
            dtype: descriptor.dtype,
            shape: descriptor.shape.clone(),
            labels: descriptor.labels.clone(),
            tile_size: descriptor.tile_size,
            meta: descriptor.meta.clone(),
            indexer,
            offsets: RwLock::new(LruCache::new(capacity)),
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

    /// Row-major flattening of a selection's non-spatial coordinates.
    fn page_index(&self, selection: &Selection) -> Result<usize, AccessError> {
        let coord = self.indexer.apply(selection, None, None)?;
        let index = (0..self.indexer.y_index())
            .fold(0, |acc, axis| acc * self.shape[axis] + coord[axis]);
        Ok(index)
    }

    /// Resolve a page's byte offset, walking the offset index at most once.
    ///
    /// Lookups are idempotent; two tasks racing on a cold page cost one extra
    /// index walk, never a wrong answer.
    async fn page_offset(&self, index: usize) -> Result<u64, AccessError> {
        {
            let mut offsets = self.offsets.write().await;
            if let Some(&offset) = offsets.get(&index) {
                return Ok(offset);
            }
        }

        trace!(page = index, "page offset not cached, walking offset index");
        let offset = self.driver.locate_page(index).await?;
        self.offsets.write().await.put(index, offset);
        Ok(offset)
    }

    async fn fetch_page(
        &self,
        selection: &Selection,
        window: Option<PixelWindow>,
    ) -> Result<Raster, AccessError> {
        let index = self.page_index(selection)?;
        let offset = self.page_offset(index).await?;
        let page = self.driver.decode_page(offset, window).await?;
        Ok(Raster {
            data: page.data,
            width: page.width,
            height: page.height,
        })
    }

    /// Number of cached page offsets, for observability.
    pub async fn cached_offset_count(&self) -> usize {
        self.offsets.read().await.len()
    }

    /// The underlying page driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

#[async_trait]
impl<D: PageDriver> PixelSource for DirectoryPixelSource<D> {
    fn dtype(&self) -> Dtype {
        self.dtype
    }

    fn shape(&self) -> &[usize] {
        &self.shape
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
        debug!("decoding full page");
        self.fetch_page(selection, None).await
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

        let fetch = async {
            trace!(x, y, "decoding page window");
            self.fetch_page(selection, Some(window))
                .await
                .map_err(TileError::from)
        };
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
