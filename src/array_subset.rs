//! Array subsets.
//!
//! An [`ArraySubset`] represents a rectangular region of an array or chunk:
//! a start coordinate and a shape. Subsets drive every traversal in this
//! crate: enumerating the chunk grid, walking the elements of one chunk, and
//! cropping a ragged edge chunk to its valid region.
//!
//! The module also provides the stride arithmetic mapping linear indices to
//! N-dimensional indices and back ([`ravel_indices`], [`unravel_index`]).

use std::iter::FusedIterator;
use std::ops::Range;

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::metadata::{ArrayIndices, ArrayShape};

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// An array subset.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Default)]
#[display("start {start:?} shape {shape:?}")]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

impl ArraySubset {
    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset from a list of [`Range`]s.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        let start = ranges.iter().map(|range| range.start).collect();
        let shape = ranges.iter().map(|range| range.end - range.start).collect();
        Self { start, shape }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the lengths of `start`
    /// and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                shape.len(),
                start.len(),
            ))
        }
    }

    /// Bound the array subset to the domain within `end` (exclusive).
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `end`
    /// does not match the array subset dimensionality.
    pub fn bound(&self, end: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if end.len() == self.dimensionality() {
            let start: ArrayIndices = std::iter::zip(&self.start, end)
                .map(|(&a, &b)| std::cmp::min(a, b))
                .collect();
            let end: ArrayIndices = std::iter::zip(self.end_exc(), end)
                .map(|(a, &b)| std::cmp::min(a, b))
                .collect();
            let shape = std::iter::zip(&start, end)
                .map(|(&start, end)| end.saturating_sub(start))
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                end.len(),
                self.dimensionality(),
            ))
        }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Returns if the array subset is empty (i.e. has a zero element in its shape).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|i| i == &0)
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the end (exclusive) of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size)
            .collect()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements of the array subset as a [`usize`].
    ///
    /// # Panics
    /// Panics if [`num_elements()`](Self::num_elements()) is greater than [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Returns [`true`] if the array subset contains `indices`.
    #[must_use]
    pub fn contains(&self, indices: &[u64]) -> bool {
        indices.len() == self.dimensionality()
            && izip!(indices, &self.start, &self.shape).all(|(&i, &o, &s)| i >= o && i < o + s)
    }

    /// Returns an iterator over the indices of elements within the subset.
    ///
    /// Iterates over the last dimension fastest (i.e. C-contiguous order).
    #[must_use]
    pub fn indices(&self) -> Indices<'_> {
        Indices::new(self)
    }
}

/// An iterator over the indices in an array subset.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// For example, consider a 4x3 array with element indices
/// ```text
/// (0, 0)  (0, 1)  (0, 2)
/// (1, 0)  (1, 1)  (1, 2)
/// (2, 0)  (2, 1)  (2, 2)
/// (3, 0)  (3, 1)  (3, 2)
/// ```
/// An iterator with an array subset corresponding to the lower right 2x2
/// region will produce `[(2, 1), (2, 2), (3, 1), (3, 2)]`.
pub struct Indices<'a> {
    subset: &'a ArraySubset,
    index_front: u64,
    index_back: u64,
    length: usize,
}

impl<'a> Indices<'a> {
    /// Create a new indices iterator.
    #[must_use]
    pub fn new(subset: &'a ArraySubset) -> Self {
        let length = subset.num_elements_usize();
        Self {
            subset,
            index_front: 0,
            index_back: length as u64,
            length,
        }
    }
}

impl Iterator for Indices<'_> {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index_front < self.index_back {
            let mut indices = unravel_index(self.index_front, self.subset.shape());
            std::iter::zip(indices.iter_mut(), self.subset.start())
                .for_each(|(index, start)| *index += start);
            self.index_front += 1;
            Some(indices)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.index_back - self.index_front).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Indices<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index_back > self.index_front {
            self.index_back -= 1;
            let mut indices = unravel_index(self.index_back, self.subset.shape());
            std::iter::zip(indices.iter_mut(), self.subset.start())
                .for_each(|(index, start)| *index += start);
            Some(indices)
        } else {
            None
        }
    }
}

impl ExactSizeIterator for Indices<'_> {}

impl FusedIterator for Indices<'_> {}

/// Return the C-order strides of `shape`: suffix products starting from 1 on
/// the right.
#[must_use]
pub fn c_strides(shape: &[u64]) -> Vec<u64> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Return the F-order strides of `shape`: prefix products starting from 1 on
/// the left.
#[must_use]
pub fn f_strides(shape: &[u64]) -> Vec<u64> {
    let mut strides = vec![1; shape.len()];
    for i in 1..shape.len() {
        strides[i] = strides[i - 1] * shape[i - 1];
    }
    strides
}

/// Convert a linear index into N-dimensional indices of an array of `shape`,
/// in C order (last dimension fastest).
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut(), shape).rev() {
        *indices_i = index % dim;
        index /= dim;
    }
    indices
}

/// Convert N-dimensional `indices` of an array of `shape` into a linear
/// index, in C order (last dimension fastest).
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    std::iter::zip(indices, c_strides(shape))
        .map(|(index, stride)| index * stride)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_bound() {
        let subset = ArraySubset::new_with_ranges(&[2..4, 2..4]);
        let bounded = subset.bound(&[3, 5]).unwrap();
        assert_eq!(bounded, ArraySubset::new_with_ranges(&[2..3, 2..4]));
        assert!(subset.bound(&[3]).is_err());
    }

    #[test]
    fn subset_contains() {
        let subset = ArraySubset::new_with_ranges(&[2..4, 0..3]);
        assert!(subset.contains(&[2, 0]));
        assert!(subset.contains(&[3, 2]));
        assert!(!subset.contains(&[4, 0]));
        assert!(!subset.contains(&[2]));
    }

    #[test]
    fn subset_indices_c_order() {
        let subset = ArraySubset::new_with_ranges(&[2..4, 1..3]);
        let indices: Vec<_> = subset.indices().collect();
        assert_eq!(
            indices,
            [vec![2, 1], vec![2, 2], vec![3, 1], vec![3, 2]]
        );
        let reversed: Vec<_> = subset.indices().rev().collect();
        assert_eq!(
            reversed,
            [vec![3, 2], vec![3, 1], vec![2, 2], vec![2, 1]]
        );
        assert_eq!(subset.indices().len(), 4);
    }

    #[test]
    fn subset_indices_rank_0() {
        let subset = ArraySubset::new_with_shape(vec![]);
        let indices: Vec<_> = subset.indices().collect();
        assert_eq!(indices, [Vec::<u64>::new()]);
    }

    #[test]
    fn strides() {
        assert_eq!(c_strides(&[4, 3, 2]), [6, 2, 1]);
        assert_eq!(f_strides(&[4, 3, 2]), [1, 4, 12]);
        assert_eq!(c_strides(&[]), Vec::<u64>::new());
    }

    #[test]
    fn ravel_unravel() {
        let shape = [4, 3, 2];
        for index in 0..24 {
            let indices = unravel_index(index, &shape);
            assert_eq!(ravel_indices(&indices, &shape), index);
        }
        assert_eq!(unravel_index(7, &shape), [1, 0, 1]);
    }
}
