//! Tile and raster behavior of the chunk-store source.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use rasterstack::{
    AccessError, ChunkedPixelSource, Dtype, LevelDescriptor, PixelSource, Selection, TileError,
    TileGrid,
};

use super::test_utils::{crop, labels, MemoryChunkStore};

fn descriptor(tile_size: Option<u32>) -> LevelDescriptor {
    LevelDescriptor {
        dtype: Dtype::Uint16,
        shape: vec![3, 10, 100, 100],
        labels: labels(&["channel", "z", "y", "x"]),
        tile_size,
        meta: None,
    }
}

fn chunk_aligned_source() -> ChunkedPixelSource<MemoryChunkStore> {
    let store = MemoryChunkStore::gradient(&[3, 10, 100, 100], &[1, 1, 50, 50]);
    ChunkedPixelSource::new(store, &descriptor(Some(50))).unwrap()
}

fn misaligned_source() -> ChunkedPixelSource<MemoryChunkStore> {
    let store = MemoryChunkStore::gradient(&[3, 10, 100, 100], &[1, 1, 50, 50]);
    ChunkedPixelSource::new(store, &descriptor(Some(64))).unwrap()
}

fn plane_selection() -> Selection {
    Selection::new().with("channel", 0).with("z", 0)
}

#[tokio::test]
async fn test_chunk_aligned_tile_is_direct_chunk_read() {
    let source = chunk_aligned_source();

    let tile = source
        .get_tile(1, 1, &plane_selection(), None)
        .await
        .unwrap();
    assert_eq!(tile.width, 50);
    assert_eq!(tile.height, 50);
    assert_eq!(source.store().chunk_reads(), 1);
    assert_eq!(source.store().window_reads(), 0);

    let raster = source.get_raster(&plane_selection()).await.unwrap();
    let window = TileGrid::new(100, 100, 50).window(1, 1).unwrap();
    let expected = crop(&raster.data, 100, Dtype::Uint16.size(), &window);
    assert_eq!(tile.data.as_ref(), expected.as_slice());
}

#[tokio::test]
async fn test_misaligned_tile_is_ranged_read() {
    let source = misaligned_source();

    let tile = source
        .get_tile(0, 0, &plane_selection(), None)
        .await
        .unwrap();
    assert_eq!(tile.width, 64);
    assert_eq!(tile.height, 64);
    assert_eq!(source.store().chunk_reads(), 0);
    assert_eq!(source.store().window_reads(), 1);

    // The final row and column are ragged: 100 - 64 = 36.
    let ragged = source
        .get_tile(1, 1, &plane_selection(), None)
        .await
        .unwrap();
    assert_eq!(ragged.width, 36);
    assert_eq!(ragged.height, 36);
    assert_eq!(source.store().window_reads(), 2);
}

#[tokio::test]
async fn test_ragged_tile_of_aligned_grid_falls_back_to_ranged_read() {
    let store = MemoryChunkStore::gradient(&[1, 1, 75, 75], &[1, 1, 50, 50]);
    let desc = LevelDescriptor {
        dtype: Dtype::Uint16,
        shape: vec![1, 1, 75, 75],
        labels: labels(&["channel", "z", "y", "x"]),
        tile_size: Some(50),
        meta: None,
    };
    let source = ChunkedPixelSource::new(store, &desc).unwrap();

    let tile = source
        .get_tile(1, 1, &plane_selection(), None)
        .await
        .unwrap();
    assert_eq!(tile.width, 25);
    assert_eq!(tile.height, 25);
    assert_eq!(source.store().chunk_reads(), 0);
    assert_eq!(source.store().window_reads(), 1);
}

#[tokio::test]
async fn test_both_paths_match_raster_crops() {
    let raster = chunk_aligned_source()
        .get_raster(&plane_selection())
        .await
        .unwrap();
    let elem = Dtype::Uint16.size();

    for (source, tile_size) in [(chunk_aligned_source(), 50), (misaligned_source(), 64)] {
        let grid = TileGrid::new(100, 100, tile_size);
        for ty in 0..grid.tiles_y() {
            for tx in 0..grid.tiles_x() {
                let tile = source
                    .get_tile(tx as u32, ty as u32, &plane_selection(), None)
                    .await
                    .unwrap();
                let window = grid.window(tx, ty).unwrap();
                assert_eq!(tile.width as usize, window.width);
                assert_eq!(tile.height as usize, window.height);
                let expected = crop(&raster.data, 100, elem, &window);
                assert_eq!(
                    tile.data.as_ref(),
                    expected.as_slice(),
                    "tile ({}, {}) at size {} differs from raster crop",
                    tx,
                    ty,
                    tile_size
                );
            }
        }
    }
}

#[tokio::test]
async fn test_reassembled_tiles_equal_raster() {
    for source in [chunk_aligned_source(), misaligned_source()] {
        let raster = source.get_raster(&plane_selection()).await.unwrap();
        let elem = Dtype::Uint16.size();
        let tile_size = source.tile_size().unwrap() as usize;
        let grid = TileGrid::new(100, 100, tile_size);

        let mut reassembled = vec![0u8; 100 * 100 * elem];
        for ty in 0..grid.tiles_y() {
            for tx in 0..grid.tiles_x() {
                let window = grid.window(tx, ty).unwrap();
                let tile = source
                    .get_tile(tx as u32, ty as u32, &plane_selection(), None)
                    .await
                    .unwrap();
                let tile_row = window.width * elem;
                for row in 0..window.height {
                    let dst = (window.y + row) * 100 * elem + window.x * elem;
                    reassembled[dst..dst + tile_row]
                        .copy_from_slice(&tile.data[row * tile_row..(row + 1) * tile_row]);
                }
            }
        }
        assert_eq!(reassembled.as_slice(), raster.data.as_ref());
    }
}

#[tokio::test]
async fn test_off_grid_tile_is_out_of_bounds() {
    let source = chunk_aligned_source();
    // 100 / 50 = 2 tiles per axis.
    for (x, y) in [(2, 0), (0, 2), (100, 100)] {
        let err = source
            .get_tile(x, y, &plane_selection(), None)
            .await
            .unwrap_err();
        assert!(err.is_out_of_bounds(), "expected OutOfBounds at ({x}, {y})");
        match err {
            TileError::OutOfBounds { tiles_x, tiles_y, .. } => {
                assert_eq!(tiles_x, 2);
                assert_eq!(tiles_y, 2);
            }
            e => panic!("expected OutOfBounds, got {:?}", e),
        }
    }
}

#[tokio::test]
async fn test_omitted_z_reads_plane_zero() {
    let source = chunk_aligned_source();
    let channel_only = Selection::new().with("channel", 0);

    // z is a spatial axis; leaving it unset selects plane 0, so the tile is
    // still served as a direct chunk read.
    let tile = source
        .get_tile(1, 1, &channel_only, None)
        .await
        .unwrap();
    assert_eq!(tile.width, 50);
    assert_eq!(tile.height, 50);
    assert_eq!(source.store().chunk_reads(), 1);
    assert_eq!(source.store().window_reads(), 0);

    let explicit = source
        .get_tile(1, 1, &plane_selection(), None)
        .await
        .unwrap();
    assert_eq!(tile.data, explicit.data);

    let raster = source.get_raster(&channel_only).await.unwrap();
    let at_z0 = source.get_raster(&plane_selection()).await.unwrap();
    assert_eq!(raster.data, at_z0.data);
}

#[tokio::test]
async fn test_incomplete_selection_fails_fast() {
    let source = chunk_aligned_source();
    let err = source
        .get_tile(0, 0, &Selection::new().with("z", 0), None)
        .await
        .unwrap_err();
    match err {
        TileError::Access(AccessError::SelectionIncomplete { label }) => {
            assert_eq!(label, "channel");
        }
        e => panic!("expected SelectionIncomplete, got {:?}", e),
    }

    let err = source.get_raster(&Selection::new()).await.unwrap_err();
    assert!(matches!(err, AccessError::SelectionIncomplete { .. }));
}

#[tokio::test]
async fn test_selection_out_of_range() {
    let source = chunk_aligned_source();
    let err = source
        .get_raster(&Selection::new().with("channel", 5).with("z", 0))
        .await
        .unwrap_err();
    match err {
        AccessError::SelectionOutOfRange { label, index, extent } => {
            assert_eq!(label, "channel");
            assert_eq!(index, 5);
            assert_eq!(extent, 3);
        }
        e => panic!("expected SelectionOutOfRange, got {:?}", e),
    }
}

#[tokio::test]
async fn test_cancelled_tile_fetch() {
    let store = MemoryChunkStore::gradient(&[3, 10, 100, 100], &[1, 1, 50, 50])
        .with_delay(Duration::from_millis(100));
    let source = ChunkedPixelSource::new(store, &descriptor(Some(50))).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err = source
        .get_tile(0, 0, &plane_selection(), Some(&token))
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_uncancelled_token_does_not_interfere() {
    let source = chunk_aligned_source();
    let token = CancellationToken::new();
    let tile = source
        .get_tile(0, 0, &plane_selection(), Some(&token))
        .await
        .unwrap();
    assert_eq!(tile.width, 50);
}

#[tokio::test]
async fn test_descriptor_mismatch_rejected() {
    let store = MemoryChunkStore::gradient(&[3, 10, 100, 100], &[1, 1, 50, 50]);
    let mut desc = descriptor(Some(50));
    desc.shape = vec![3, 10, 100, 200];
    assert!(ChunkedPixelSource::new(store, &desc).is_err());

    let store = MemoryChunkStore::gradient(&[3, 10, 100, 100], &[1, 1, 50, 50]);
    let mut desc = descriptor(Some(50));
    desc.labels.pop();
    assert!(ChunkedPixelSource::new(store, &desc).is_err());
}

#[tokio::test]
async fn test_tile_size_defaults_to_chunk_extent() {
    let store = MemoryChunkStore::gradient(&[3, 10, 100, 100], &[1, 1, 50, 50]);
    let source = ChunkedPixelSource::new(store, &descriptor(None)).unwrap();
    assert_eq!(source.tile_size(), Some(50));
}
