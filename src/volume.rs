//! Volume assembly: per-plane fetches into one contiguous 3-D buffer.
//!
//! Given a selection without `z`, the engine fetches every `depth_downsample`-th
//! plane concurrently and copies each into its fixed slot of a pre-sized
//! buffer. Slot placement is determined by the output z index, never by
//! completion order, so the result is deterministic under any interleaving.
//! The copy step is also the single place the canonical volume orientation is
//! enforced, uniformly across backends: planes in ascending output-z order,
//! rows flipped vertically (backends deliver rows top-to-bottom; the volume
//! convention is bottom-to-top with z increasing away from the viewer).
//!
//! Concurrency model: planes race only against each other; each writes a
//! disjoint z-slot range and the copies run in the single draining task, so
//! there is no lock anywhere in the engine. Concurrency is bounded only by
//! the backend's own transport and decode limits.

use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::dtype::Dtype;
use crate::error::AccessError;
use crate::indexer::Z_LABEL;
use crate::selection::Selection;
use crate::source::PixelSource;

// =============================================================================
// Results and progress events
// =============================================================================

/// One assembled z-stack.
///
/// `data` holds `depth` planes of `width * height` elements each, contiguous,
/// in the canonical orientation described at the module level.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Raw element bytes for all planes
    pub data: Bytes,
    /// Plane width in pixels
    pub width: u32,
    /// Plane height in pixels
    pub height: u32,
    /// Number of planes: `floor(native_depth / depth_downsample)`
    pub depth: u32,
    /// Element kind, copied from the source
    pub dtype: Dtype,
}

/// Which half of a plane's lifecycle a progress event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanePhase {
    /// The plane fetch was issued
    Issued,
    /// The plane arrived and was copied into its slot
    Loaded,
}

/// One progress event from volume assembly.
///
/// Exactly two events are emitted per plane, each advancing `fraction` by
/// `0.5 / output_depth`; the fraction of the final event is 1.0 (within
/// floating-point tolerance). Events arrive on an unbounded channel so a slow
/// consumer can never stall assembly; a dropped receiver is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeProgress {
    /// Phase this event marks
    pub phase: PlanePhase,
    /// Cumulative completed fraction of the whole call, in `[0, 1]`
    pub fraction: f64,
}

/// Sending half of the progress event stream.
pub type ProgressSender = mpsc::UnboundedSender<VolumeProgress>;

// =============================================================================
// Assembly
// =============================================================================

/// Assemble one volume from per-plane fetches.
///
/// `selection` pins every non-spatial axis except `z`. Planes are fetched at
/// `z = z_out * depth_downsample` for `z_out` in `[0, output_depth)`, where
/// `output_depth = floor(native_depth / depth_downsample)`.
///
/// # Errors
///
/// - [`AccessError::InvalidDownsampleFactor`] for `depth_downsample == 0`
/// - [`AccessError::AxisNotFound`] when the source has no `z` axis
/// - [`AccessError::PlaneShapeMismatch`] when a plane decodes to dimensions
///   other than the level extent
/// - any per-plane fetch error, surfaced as-is
pub async fn assemble_volume<S>(
    source: &S,
    selection: &Selection,
    progress: Option<&ProgressSender>,
    depth_downsample: usize,
) -> Result<Volume, AccessError>
where
    S: PixelSource + ?Sized,
{
    if depth_downsample == 0 {
        return Err(AccessError::InvalidDownsampleFactor);
    }
    let z_axis = source
        .axis_index(Z_LABEL)
        .ok_or_else(|| AccessError::AxisNotFound {
            label: Z_LABEL.to_string(),
        })?;
    let native_depth = source.shape()[z_axis];
    let output_depth = native_depth / depth_downsample;

    let (width, height) = source.image_extent();
    let row_bytes = width * source.samples_per_pixel() * source.dtype().size();
    let plane_bytes = row_bytes * height;
    let mut data = vec![0u8; plane_bytes * output_depth];

    debug!(
        native_depth,
        output_depth, depth_downsample, width, height, "assembling volume"
    );

    // Two events per plane, so each advances the fraction by this step.
    let step = 0.5 / output_depth.max(1) as f64;
    let mut fraction = 0.0;

    let mut fetches = FuturesUnordered::new();
    for z_out in 0..output_depth {
        let mut plane_selection = selection.clone();
        plane_selection.set(Z_LABEL, z_out * depth_downsample);
        fraction += step;
        emit(progress, PlanePhase::Issued, fraction);
        fetches.push(async move {
            let raster = source.get_raster(&plane_selection).await?;
            Ok::<_, AccessError>((z_out, raster))
        });
    }

    while let Some(fetched) = fetches.next().await {
        let (z_out, raster) = fetched?;
        if (raster.width as usize, raster.height as usize) != (width, height) {
            return Err(AccessError::PlaneShapeMismatch {
                z: z_out * depth_downsample,
                width: width as u32,
                height: height as u32,
                got_width: raster.width,
                got_height: raster.height,
            });
        }
        debug_assert_eq!(raster.data.len(), plane_bytes);
        copy_plane(
            &mut data[z_out * plane_bytes..][..plane_bytes],
            &raster.data,
            height,
            row_bytes,
        );
        fraction += step;
        emit(progress, PlanePhase::Loaded, fraction);
    }

    Ok(Volume {
        data: data.into(),
        width: width as u32,
        height: height as u32,
        depth: output_depth as u32,
        dtype: source.dtype(),
    })
}

/// Assemble one volume per selection, returned in request order.
///
/// Each selection runs through [`assemble_volume`] independently; with a
/// progress sender attached, every selection's fractions sum to 1.0 on their
/// own.
pub async fn assemble_volumes<S>(
    source: &S,
    selections: &[Selection],
    progress: Option<&ProgressSender>,
    depth_downsample: usize,
) -> Result<Vec<Volume>, AccessError>
where
    S: PixelSource + ?Sized,
{
    let mut volumes = Vec::with_capacity(selections.len());
    for selection in selections {
        volumes.push(assemble_volume(source, selection, progress, depth_downsample).await?);
    }
    Ok(volumes)
}

/// Copy one plane into its z slot, flipping rows into the volume orientation.
///
/// Moves whole rows of element bytes; sample values are never interpreted.
fn copy_plane(dst: &mut [u8], src: &[u8], height: usize, row_bytes: usize) {
    for row in 0..height {
        let flipped = height - 1 - row;
        dst[flipped * row_bytes..][..row_bytes]
            .copy_from_slice(&src[row * row_bytes..][..row_bytes]);
    }
}

fn emit(progress: Option<&ProgressSender>, phase: PlanePhase, fraction: f64) {
    if let Some(tx) = progress {
        // The receiver may be gone; assembly does not care.
        let _ = tx.send(VolumeProgress { phase, fraction });
    }
}
