use thiserror::Error;

/// Errors reported by storage backends (chunk stores and page drivers).
///
/// These cover the transport and decode side of a fetch. This crate never
/// retries them; retry, pooling and timeout policy belong to the driver.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Transport failure while fetching bytes (network, object storage, ...)
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Decode failure while turning fetched bytes into pixels
    #[error("decode failed: {0}")]
    Decode(String),

    /// Chunk coordinate does not exist in the store
    #[error("no chunk at coordinate {coord:?}")]
    MissingChunk { coord: Vec<usize> },

    /// Page index does not exist in the container
    #[error("no page at index {index} (container has {count})")]
    MissingPage { index: usize, count: usize },
}

/// Errors for plane and volume access (`get_raster` / `get_volume`).
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// A required non-spatial axis is missing from the selection
    #[error("selection is missing required axis {label:?}")]
    SelectionIncomplete { label: String },

    /// A selection index exceeds its axis extent
    #[error("selection index {index} out of range for axis {label:?} (extent {extent})")]
    SelectionOutOfRange {
        label: String,
        index: usize,
        extent: usize,
    },

    /// The source has no axis with the given label
    #[error("source has no axis {label:?}")]
    AxisNotFound { label: String },

    /// Depth downsample factor must be >= 1
    #[error("depth downsample factor must be positive")]
    InvalidDownsampleFactor,

    /// A fetched plane decoded to dimensions other than the level extent
    #[error("plane at z={z} decoded to {got_width}x{got_height}, expected {width}x{height}")]
    PlaneShapeMismatch {
        z: usize,
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },

    /// Backend fetch or decode failure, surfaced as-is
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Errors for tile access (`get_tile`).
///
/// `OutOfBounds` is recoverable by design: a renderer walking the visible
/// grid treats it as "no tile, skip silently, do not retry". It is a separate
/// variant precisely so it can never be conflated with a backend failure.
/// `Cancelled` is likewise a distinguishable non-failure outcome.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Tile coordinate lies entirely outside the tile grid
    #[error("tile ({x}, {y}) is outside the {tiles_x}x{tiles_y} tile grid")]
    OutOfBounds {
        x: u32,
        y: u32,
        tiles_x: u32,
        tiles_y: u32,
    },

    /// The caller's cancellation token fired before the fetch completed
    #[error("tile fetch was cancelled")]
    Cancelled,

    /// Selection or backend failure, same taxonomy as plane access
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl TileError {
    /// True when the tile coordinate was simply off the edge of the image.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, TileError::OutOfBounds { .. })
    }

    /// True when the caller cancelled the fetch.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TileError::Cancelled)
    }
}

impl From<BackendError> for TileError {
    fn from(err: BackendError) -> Self {
        TileError::Access(AccessError::Backend(err))
    }
}

/// Errors raised while assembling a pyramid from per-level sources.
#[derive(Debug, Clone, Error)]
pub enum PyramidError {
    /// A pyramid needs at least the full-resolution level
    #[error("pyramid has no levels")]
    Empty,

    /// All levels must share one set of axis labels
    #[error("level {level} labels {got:?} differ from level 0 labels {expected:?}")]
    LabelMismatch {
        level: usize,
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// Spatial extents must shrink (or hold) from one level to the next
    #[error("level {level} extent {got_width}x{got_height} exceeds the previous level's {prev_width}x{prev_height}")]
    NotDownsampled {
        level: usize,
        prev_width: usize,
        prev_height: usize,
        got_width: usize,
        got_height: usize,
    },
}

/// Error from constructing a source against a normalized level descriptor
/// that contradicts itself or its driver.
#[derive(Debug, Clone, Error)]
#[error("invalid level descriptor: {reason}")]
pub struct InvalidDescriptor {
    pub reason: String,
}

/// Error from parsing a backend dtype code.
#[derive(Debug, Clone, Error)]
#[error("unsupported dtype code {code:?}")]
pub struct UnsupportedDtype {
    pub code: String,
}
