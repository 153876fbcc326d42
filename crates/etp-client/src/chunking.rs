//! Large-payload splitting: data-object chunks and data-array tiling.
//!
//! # Object chunking
//! An object body larger than the negotiated `MaxDataObjectSize` is put as
//! metadata carrying a fresh `blob_id` plus `Chunk` messages holding the
//! body slices.  Receiving stitches chunk payloads back onto their object
//! by `blob_id`.
//!
//! # Array tiling
//! Arrays larger than `MaxDataArraySize` travel as subarray windows.  The
//! tiler blocks along the outermost splittable axis, so every window is a
//! contiguous row-major range of the flat buffer; stitching is a sorted
//! concatenation.

use std::collections::BTreeMap;

use etp_proto::CodecError;
use etp_proto::arrays::AnyArray;
use etp_proto::messages::store::{Chunk, DataObject};
use uuid::Uuid;

use crate::error::ClientError;

/// One rectangular window of an array, per-dimension start and count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubarrayWindow {
    pub starts: Vec<i64>,
    pub counts: Vec<i64>,
}

impl SubarrayWindow {
    pub fn element_count(&self) -> i64 {
        self.counts.iter().product()
    }

    /// Offset of the window's first element in the row-major flat buffer.
    ///
    /// Only meaningful for the contiguous windows this tiler produces.
    pub fn flat_offset(&self, dimensions: &[i64]) -> i64 {
        let mut stride = 1;
        let mut offset = 0;
        for (start, dim) in self.starts.iter().zip(dimensions).rev() {
            offset += start * stride;
            stride *= dim;
        }
        offset
    }
}

/// Tile a shape into row-major windows of at most `max_elements` elements.
///
/// Windows are disjoint, cover the full shape, and each is a contiguous
/// flat range: axes inside the split axis are always taken whole.
pub fn tile_windows(dimensions: &[i64], max_elements: i64) -> Vec<SubarrayWindow> {
    let max_elements = max_elements.max(1);
    let total: i64 = dimensions.iter().product();
    if dimensions.is_empty() || total <= max_elements {
        return vec![SubarrayWindow {
            starts: vec![0; dimensions.len()],
            counts: dimensions.to_vec(),
        }];
    }

    // Outermost axis whose suffix fits the budget; the last axis at worst.
    let mut axis = 0;
    while axis + 1 < dimensions.len() {
        let suffix: i64 = dimensions[axis + 1..].iter().product();
        if suffix <= max_elements {
            break;
        }
        axis += 1;
    }
    let suffix: i64 = dimensions[axis + 1..].iter().product();
    let block = (max_elements / suffix).max(1);

    // Walk every coordinate of the axes before the split axis, blocking
    // along the split axis itself.
    let mut windows = Vec::new();
    let mut prefix = vec![0i64; axis];
    loop {
        let mut start = 0;
        while start < dimensions[axis] {
            let count = block.min(dimensions[axis] - start);
            let mut starts = prefix.clone();
            starts.push(start);
            starts.extend(std::iter::repeat_n(0, dimensions.len() - axis - 1));
            let mut counts = vec![1; axis];
            counts.push(count);
            counts.extend_from_slice(&dimensions[axis + 1..]);
            windows.push(SubarrayWindow { starts, counts });
            start += count;
        }

        // Odometer over the prefix coordinates.
        let mut i = axis;
        loop {
            if i == 0 {
                return windows;
            }
            i -= 1;
            prefix[i] += 1;
            if prefix[i] < dimensions[i] {
                break;
            }
            prefix[i] = 0;
        }
    }
}

/// Stitch subarray windows back into one flat buffer.
///
/// The windows must be the contiguous tiles produced by [`tile_windows`]
/// (possibly reordered); gaps or overlaps are a protocol fault.
pub fn stitch_windows(
    dimensions: &[i64],
    mut tiles: Vec<(SubarrayWindow, AnyArray)>,
) -> Result<AnyArray, ClientError> {
    let total: i64 = dimensions.iter().product();
    let Some(kind) = tiles.first().map(|(_, data)| data.kind()) else {
        return Err(CodecError::Format("no subarray tiles to stitch".to_owned()).into());
    };

    tiles.sort_by_key(|(window, _)| window.flat_offset(dimensions));

    let mut next_offset = 0;
    let mut flat = AnyArray::empty_of(kind);
    for (window, data) in tiles {
        if window.flat_offset(dimensions) != next_offset {
            return Err(CodecError::Format("subarray windows do not tile the shape".to_owned()).into());
        }
        if i64::try_from(data.len()).unwrap_or(i64::MAX) != window.element_count() {
            return Err(
                CodecError::Format("subarray payload does not match its window".to_owned()).into()
            );
        }
        next_offset += window.element_count();
        flat.extend(data)?;
    }
    if next_offset != total {
        return Err(CodecError::Format("subarray windows do not cover the shape".to_owned()).into());
    }
    Ok(flat)
}

/// Split an object body into metadata plus chunks when it exceeds
/// `max_object_size`.  Small objects pass through untouched.
pub(crate) fn split_object(
    mut object: DataObject,
    max_object_size: usize,
) -> (DataObject, Vec<Chunk>) {
    if object.data.len() <= max_object_size {
        return (object, Vec::new());
    }
    let blob_id = Uuid::new_v4();
    let body = std::mem::take(&mut object.data);
    object.blob_id = Some(blob_id);

    let chunk_count = body.len().div_ceil(max_object_size);
    let chunks = body
        .chunks(max_object_size)
        .enumerate()
        .map(|(index, slice)| Chunk {
            blob_id,
            data: slice.to_vec(),
            final_chunk: index == chunk_count - 1,
        })
        .collect();
    (object, chunks)
}

/// Stitch received chunks back onto their objects by blob id.
pub(crate) fn stitch_chunks(objects: &mut BTreeMap<String, DataObject>, chunks: Vec<Chunk>) {
    for chunk in chunks {
        let owner = objects
            .values_mut()
            .find(|object| object.blob_id == Some(chunk.blob_id));
        match owner {
            Some(object) => object.data.extend_from_slice(&chunk.data),
            None => {
                tracing::warn!(blob_id = %chunk.blob_id, "chunk without a parent object, dropping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use etp_proto::messages::discovery::Resource;
    use etp_proto::messages::ActiveStatusKind;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn small_shapes_are_a_single_window() {
        let windows = tile_windows(&[10, 10], 1_000);
        assert_eq!(
            windows,
            vec![SubarrayWindow { starts: vec![0, 0], counts: vec![10, 10] }]
        );
    }

    #[test]
    fn the_spec_example_tiles_into_four_row_blocks() {
        // 1000x1000 doubles against a 250k element budget.
        let windows = tile_windows(&[1000, 1000], 250_000);
        assert_eq!(windows.len(), 4);
        for (i, window) in windows.iter().enumerate() {
            assert_eq!(window.starts, vec![i as i64 * 250, 0]);
            assert_eq!(window.counts, vec![250, 1000]);
        }
    }

    #[test]
    fn uneven_shapes_get_a_short_tail_window() {
        let windows = tile_windows(&[10, 7], 30);
        // 4 rows of 7 fit in 30; 10 rows -> 4+4+2.
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].starts, vec![8, 0]);
        assert_eq!(windows[2].counts, vec![2, 7]);
    }

    #[test]
    fn oversized_rows_split_along_inner_axes() {
        let windows = tile_windows(&[2, 100], 40);
        assert_eq!(windows.len(), 6);
        assert_eq!(windows[0].counts, vec![1, 40]);
        assert_eq!(windows[2].counts, vec![1, 20]);
        let covered: i64 = windows.iter().map(SubarrayWindow::element_count).sum();
        assert_eq!(covered, 200);
    }

    #[test]
    fn stitch_restores_the_tiled_buffer() {
        let dimensions = [8, 5];
        let full = AnyArray::Long((0..40).collect());
        let mut tiles: Vec<(SubarrayWindow, AnyArray)> = tile_windows(&dimensions, 12)
            .into_iter()
            .map(|window| {
                let offset = usize::try_from(window.flat_offset(&dimensions)).unwrap();
                let len = usize::try_from(window.element_count()).unwrap();
                let data = full.slice(offset, len);
                (window, data)
            })
            .collect();
        // Server replies arrive in arbitrary order.
        tiles.reverse();
        assert_eq!(stitch_windows(&dimensions, tiles).unwrap(), full);
    }

    #[test]
    fn stitch_rejects_gaps() {
        let dimensions = [4, 2];
        let tiles = vec![(
            SubarrayWindow { starts: vec![2, 0], counts: vec![2, 2] },
            AnyArray::Long(vec![0; 4]),
        )];
        assert!(stitch_windows(&dimensions, tiles).is_err());
    }

    proptest! {
        /// Tiles are disjoint, contiguous, and cover the shape, whatever
        /// the dimensions and budget.
        #[test]
        fn tiling_covers_any_shape(
            dims in proptest::collection::vec(1i64..20, 1..4),
            max_elements in 1i64..500,
        ) {
            let windows = tile_windows(&dims, max_elements);
            let total: i64 = dims.iter().product();

            let mut offsets: Vec<(i64, i64)> = windows
                .iter()
                .map(|w| (w.flat_offset(&dims), w.element_count()))
                .collect();
            offsets.sort_unstable();

            let mut next = 0;
            for (offset, len) in offsets {
                prop_assert_eq!(offset, next, "windows must be contiguous and disjoint");
                prop_assert!(len >= 1);
                next = offset + len;
            }
            prop_assert_eq!(next, total, "windows must cover the shape");
        }
    }

    fn object_with_body(len: usize) -> DataObject {
        DataObject {
            resource: Resource {
                uri: "eml:///dataspace('d')/resqml22.Fault(u)".to_owned(),
                name: "f".to_owned(),
                source_count: None,
                target_count: None,
                last_changed: 0,
                store_last_write: 0,
                active_status: ActiveStatusKind::Active,
            },
            format: "xml".to_owned(),
            blob_id: None,
            data: (0..len).map(|i| (i % 256) as u8).collect(),
        }
    }

    #[test]
    fn small_objects_are_not_chunked() {
        let (object, chunks) = split_object(object_with_body(100), 1_000);
        assert!(chunks.is_empty());
        assert!(object.blob_id.is_none());
        assert_eq!(object.data.len(), 100);
    }

    #[test]
    fn large_objects_split_and_stitch_back() {
        let original = object_with_body(2_500);
        let expected = original.data.clone();
        let (object, chunks) = split_object(original, 1_000);

        assert!(object.data.is_empty());
        assert_eq!(chunks.len(), 3);
        assert!(chunks[2].final_chunk);
        assert!(!chunks[0].final_chunk);

        let mut objects = BTreeMap::from([("0".to_owned(), object)]);
        stitch_chunks(&mut objects, chunks);
        assert_eq!(objects["0"].data, expected);
    }
}
