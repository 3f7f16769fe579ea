//! # rasterstack
//!
//! A format-agnostic access layer over large, multi-resolution,
//! multi-dimensional scientific raster images. Whether an image lives in a
//! regularly chunked array store or a directory-of-pages container, a
//! renderer gets one uniform contract: "give me this tile", "give me this
//! plane", "give me this z-stack".
//!
//! ## Features
//!
//! - **Two storage geometries, one contract**: a chunk-store source and a
//!   directory/page source implement the same [`PixelSource`] trait
//! - **Correct edges**: ragged tile windows at pyramid and image boundaries
//!   computed in one shared place
//! - **Volume assembly**: concurrent per-plane fetches into one contiguous
//!   3-D buffer with depth downsampling and a progress event stream
//! - **Typed buffers**: a closed [`Dtype`] enumeration instead of name-keyed
//!   dynamic lookup
//!
//! ## Architecture
//!
//! - [`dtype`], [`selection`], [`indexer`] - element kinds, axis selections,
//!   and the mapping onto backend-native coordinates
//! - [`geometry`] - shared tile grid and ragged-edge math
//! - [`meta`] - normalized per-level descriptors handed over by external
//!   metadata parsers
//! - [`driver`] - the downstream seam: chunk-store and page-driver traits
//! - [`source`] - the [`PixelSource`] contract and its two variants
//! - [`volume`] - the volume assembly engine
//! - [`pyramid`] - ordered resolution levels, validated at load time
//!
//! ## Example
//!
//! ```ignore
//! use rasterstack::{ChunkedPixelSource, PixelSource, Pyramid, Selection};
//!
//! // One source per resolution level, from externally parsed descriptors.
//! let levels = descriptors
//!     .iter()
//!     .map(|d| ChunkedPixelSource::new(open_level(d), d))
//!     .collect::<Result<Vec<_>, _>>()?;
//! let pyramid = Pyramid::new(levels)?;
//!
//! let selection = Selection::new().with("channel", 0).with("z", 3);
//! let tile = pyramid.base().get_tile(1, 2, &selection, None).await?;
//! ```

pub mod driver;
pub mod dtype;
pub mod error;
pub mod geometry;
pub mod indexer;
pub mod meta;
pub mod pyramid;
pub mod selection;
pub mod source;
pub mod volume;

// Re-export commonly used types
pub use driver::{ChunkStore, DecodedPage, PageDriver};
pub use dtype::Dtype;
pub use error::{
    AccessError, BackendError, InvalidDescriptor, PyramidError, TileError, UnsupportedDtype,
};
pub use geometry::{PixelWindow, TileGrid};
pub use indexer::{is_interleaved, Indexer, X_LABEL, Y_LABEL, Z_LABEL};
pub use meta::{LevelDescriptor, PhysicalSize, SourceMeta};
pub use pyramid::Pyramid;
pub use selection::Selection;
pub use source::{ChunkedPixelSource, DirectoryPixelSource, PixelSource, Raster};
pub use volume::{
    assemble_volume, assemble_volumes, PlanePhase, ProgressSender, Volume, VolumeProgress,
};
