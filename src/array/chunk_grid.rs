//! The regular chunk grid of a Zarr v2 array.
//!
//! An array of shape `shape` with chunk shape `chunks` is partitioned into a
//! grid of `ceil(shape[i] / chunks[i])` chunks per dimension `i`. Chunks at
//! the end of any dimension may extend past the array bounds; only their
//! intersection with the array holds logical elements.

use thiserror::Error;

use crate::{
    array_subset::{unravel_index, ArraySubset, IncompatibleDimensionalityError},
    metadata::{ArrayIndices, ArrayShape, DimensionSeparator},
};

/// A regular chunk grid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChunkGrid {
    array_shape: ArrayShape,
    chunk_shape: ArrayShape,
    grid_shape: ArrayShape,
}

/// A chunk grid creation error.
#[derive(Debug, Error)]
pub enum ChunkGridCreateError {
    /// The array shape and chunk shape have different ranks.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// A chunk dimension is zero.
    #[error("chunk shape {0:?} has a zero dimension")]
    ZeroChunkDimension(ArrayShape),
}

impl ChunkGrid {
    /// Create a new regular chunk grid.
    ///
    /// # Errors
    /// Returns a [`ChunkGridCreateError`] if the shapes have different ranks
    /// or any chunk dimension is zero.
    pub fn new(
        array_shape: ArrayShape,
        chunk_shape: ArrayShape,
    ) -> Result<Self, ChunkGridCreateError> {
        if array_shape.len() != chunk_shape.len() {
            return Err(IncompatibleDimensionalityError::new(
                chunk_shape.len(),
                array_shape.len(),
            )
            .into());
        }
        if chunk_shape.iter().any(|&c| c == 0) {
            return Err(ChunkGridCreateError::ZeroChunkDimension(chunk_shape));
        }
        let grid_shape = std::iter::zip(&array_shape, &chunk_shape)
            .map(|(&array, &chunk)| array.div_ceil(chunk))
            .collect();
        Ok(Self {
            array_shape,
            chunk_shape,
            grid_shape,
        })
    }

    /// Return the array shape.
    #[must_use]
    pub fn array_shape(&self) -> &[u64] {
        &self.array_shape
    }

    /// Return the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[u64] {
        &self.chunk_shape
    }

    /// Return the shape of the chunk grid: `ceil(shape[i] / chunks[i])` per
    /// dimension `i`.
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }

    /// Return the dimensionality of the grid.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.array_shape.len()
    }

    /// Return the total number of chunks.
    ///
    /// A rank-0 array has a single chunk.
    #[must_use]
    pub fn num_chunks(&self) -> u64 {
        self.grid_shape.iter().product()
    }

    /// Return the number of elements in a full chunk.
    #[must_use]
    pub fn chunk_num_elements(&self) -> u64 {
        self.chunk_shape.iter().product()
    }

    /// Convert a linear chunk index in `[0, num_chunks)` into N-dimensional
    /// chunk grid indices, in chunk-major (C) order.
    #[must_use]
    pub fn chunk_indices(&self, chunk_index: u64) -> ArrayIndices {
        unravel_index(chunk_index, &self.grid_shape)
    }

    /// Return the subset of the *full* chunk at `chunk_indices`, which may
    /// extend past the array bounds.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_indices` has the
    /// wrong rank.
    pub fn chunk_subset(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        if chunk_indices.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                chunk_indices.len(),
                self.dimensionality(),
            ));
        }
        let start = std::iter::zip(chunk_indices, &self.chunk_shape)
            .map(|(&index, &chunk)| index * chunk)
            .collect();
        ArraySubset::new_with_start_shape(start, self.chunk_shape.clone())
    }

    /// Return the subset of the chunk at `chunk_indices` bounded by the
    /// array shape: the logically valid region of the chunk.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_indices` has the
    /// wrong rank.
    pub fn chunk_subset_bounded(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        self.chunk_subset(chunk_indices)?.bound(&self.array_shape)
    }

    /// Encode the key of the chunk at `chunk_indices`.
    ///
    /// The key is the decimal grid indices joined by `separator`. A rank-0
    /// array has the single chunk key `0`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64], separator: DimensionSeparator) -> String {
        if chunk_indices.is_empty() {
            "0".to_string()
        } else {
            chunk_indices
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<String>>()
                .join(&separator.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_grid_shape() {
        let grid = ChunkGrid::new(vec![10, 10], vec![3, 5]).unwrap();
        assert_eq!(grid.grid_shape(), &[4, 2]);
        assert_eq!(grid.num_chunks(), 8);
        assert_eq!(grid.chunk_num_elements(), 15);
    }

    #[test]
    fn chunk_grid_invalid() {
        assert!(ChunkGrid::new(vec![10, 10], vec![3]).is_err());
        assert!(ChunkGrid::new(vec![10], vec![0]).is_err());
    }

    #[test]
    fn chunk_grid_empty_dimension() {
        let grid = ChunkGrid::new(vec![0], vec![2]).unwrap();
        assert_eq!(grid.grid_shape(), &[0]);
        assert_eq!(grid.num_chunks(), 0);
    }

    #[test]
    fn chunk_grid_rank_0() {
        let grid = ChunkGrid::new(vec![], vec![]).unwrap();
        assert_eq!(grid.num_chunks(), 1);
        assert_eq!(grid.chunk_num_elements(), 1);
        assert_eq!(grid.chunk_indices(0), Vec::<u64>::new());
        assert_eq!(grid.chunk_key(&[], DimensionSeparator::Dot), "0");
    }

    #[test]
    fn chunk_indices_round_trip() {
        let grid = ChunkGrid::new(vec![10, 10], vec![3, 5]).unwrap();
        let mut linear = 0;
        for i in 0..4 {
            for j in 0..2 {
                assert_eq!(grid.chunk_indices(linear), [i, j]);
                linear += 1;
            }
        }
    }

    #[test]
    fn chunk_subsets() {
        let grid = ChunkGrid::new(vec![5], vec![2]).unwrap();
        assert_eq!(grid.grid_shape(), &[3]);
        assert_eq!(
            grid.chunk_subset(&[2]).unwrap(),
            ArraySubset::new_with_ranges(&[4..6])
        );
        assert_eq!(
            grid.chunk_subset_bounded(&[2]).unwrap(),
            ArraySubset::new_with_ranges(&[4..5])
        );
    }

    #[test]
    fn chunk_keys() {
        let grid = ChunkGrid::new(vec![10, 10], vec![5, 5]).unwrap();
        assert_eq!(grid.chunk_key(&[1, 2], DimensionSeparator::Dot), "1.2");
        assert_eq!(grid.chunk_key(&[1, 2], DimensionSeparator::Slash), "1/2");
        assert_eq!(grid.chunk_key(&[0, 0], DimensionSeparator::Dot), "0.0");
    }
}
