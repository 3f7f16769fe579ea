//! Format-driver traits: the seam between this core and storage backends.
//!
//! The access layer never talks to the network or a codec directly. A chunked
//! array store and a directory-of-pages container each expose a small async
//! surface here; connection pooling, decode worker pools, retries and
//! timeouts all live behind these traits.

use std::ops::Range;

use async_trait::async_trait;
use bytes::Bytes;

use crate::dtype::Dtype;
use crate::error::BackendError;
use crate::geometry::PixelWindow;

/// Driver for a regularly chunked array store.
///
/// The store holds one n-dimensional array split into fixed-size chunks.
/// Implementations must return raw element bytes in row-major order with no
/// per-element reordering; the access layer sizes buffers from `dtype` and
/// `shape` and treats the payload as opaque element groups.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Per-axis extents of the full array, native axis order.
    fn shape(&self) -> &[usize];

    /// Per-axis chunk extents, same order and rank as `shape`.
    fn chunk_shape(&self) -> &[usize];

    /// Element kind of the stored array.
    fn dtype(&self) -> Dtype;

    /// Read one whole chunk by per-axis chunk coordinate.
    ///
    /// The payload length is the product of `chunk_shape` extents times the
    /// element size. Edge chunks are returned at full nominal size (stores
    /// pad them); callers only take this path for windows that coincide with
    /// an interior chunk exactly.
    async fn read_chunk(&self, coord: &[usize]) -> Result<Bytes, BackendError>;

    /// Read an arbitrary hyperslab, one half-open range per axis.
    ///
    /// The payload is the row-major concatenation of the selected elements,
    /// length = product of range lengths times the element size.
    async fn read_window(&self, ranges: &[Range<usize>]) -> Result<Bytes, BackendError>;
}

/// One decoded 2-D page (or a window of it).
#[derive(Debug, Clone)]
pub struct DecodedPage {
    /// Raw element bytes, row-major, top-to-bottom
    pub data: Bytes,
    /// Decoded width in pixels
    pub width: u32,
    /// Decoded height in pixels
    pub height: u32,
}

/// Driver for a directory-of-pages container.
///
/// The container is a flat sequence of independently addressable 2-D pages;
/// each distinct non-spatial selection maps to exactly one page. Locating a
/// page may require walking an offset index, which can be expensive, so the
/// access layer calls [`locate_page`](PageDriver::locate_page) once per page
/// and caches the handle.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Number of pages in the container.
    fn page_count(&self) -> usize;

    /// Resolve a page index to its byte offset within the container.
    ///
    /// Called at most once per page per source; results are cached upstream.
    async fn locate_page(&self, index: usize) -> Result<u64, BackendError>;

    /// Decode a page, or just a window of it, into raw pixels.
    ///
    /// `offset` is the handle returned by `locate_page`. With `window` set,
    /// the decoded dimensions equal the window's; otherwise they equal the
    /// full page's.
    async fn decode_page(
        &self,
        offset: u64,
        window: Option<PixelWindow>,
    ) -> Result<DecodedPage, BackendError>;
}
