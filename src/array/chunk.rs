//! In-memory chunks.
//!
//! A [`Chunk`] is an N-dimensional tile of elements held in row-major (C)
//! order. It stores only the logically valid region of a chunk: a chunk on
//! the ragged edge of an array is shorter than the declared chunk shape.

use thiserror::Error;

use crate::{
    array_subset::ravel_indices,
    metadata::ArrayShape,
};

/// An in-memory N-dimensional tile of elements, in row-major (C) order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Chunk<T> {
    shape: ArrayShape,
    elements: Vec<T>,
}

/// A chunk shape and element count mismatch error.
#[derive(Debug, Error)]
#[error("chunk of shape {shape:?} needs {expected} elements, got {got}")]
pub struct InvalidChunkShapeError {
    shape: ArrayShape,
    expected: u64,
    got: usize,
}

impl<T> Chunk<T> {
    /// Create a new chunk of `shape` from `elements` in row-major order.
    ///
    /// # Errors
    /// Returns [`InvalidChunkShapeError`] if the number of elements does not
    /// equal the product of `shape`.
    pub fn new(shape: ArrayShape, elements: Vec<T>) -> Result<Self, InvalidChunkShapeError> {
        let expected = shape.iter().product::<u64>();
        if Ok(elements.len()) == usize::try_from(expected) {
            Ok(Self { shape, elements })
        } else {
            Err(InvalidChunkShapeError {
                shape,
                expected,
                got: elements.len(),
            })
        }
    }

    /// Return the shape of the chunk.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the number of elements of the chunk.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Return the element at an in-chunk offset, or [`None`] if out of bounds.
    #[must_use]
    pub fn get(&self, indices: &[u64]) -> Option<&T> {
        if indices.len() == self.shape.len()
            && std::iter::zip(indices, &self.shape).all(|(index, dim)| index < dim)
        {
            let linear = usize::try_from(ravel_indices(indices, &self.shape)).ok()?;
            self.elements.get(linear)
        } else {
            None
        }
    }

    /// Return the elements of the chunk in row-major order.
    #[must_use]
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Consume the chunk, returning its elements in row-major order.
    #[must_use]
    pub fn into_elements(self) -> Vec<T> {
        self.elements
    }

    /// Fold every element left-to-right in row-major order.
    pub fn fold_left<B, F: FnMut(B, &T) -> B>(&self, init: B, f: F) -> B {
        self.elements.iter().fold(init, f)
    }

    /// Fold every element right-to-left in row-major order.
    pub fn fold_right<B, F: FnMut(&T, B) -> B>(&self, init: B, mut f: F) -> B {
        self.elements.iter().rev().fold(init, |acc, v| f(v, acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_new() {
        assert!(Chunk::new(vec![2, 3], vec![0; 6]).is_ok());
        assert!(Chunk::new(vec![2, 3], vec![0; 5]).is_err());
        // A rank-0 chunk holds one element.
        assert!(Chunk::new(vec![], vec![0]).is_ok());
        assert!(Chunk::new(vec![], Vec::<i32>::new()).is_err());
    }

    #[test]
    fn chunk_get() {
        let chunk = Chunk::new(vec![2, 3], vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(chunk.get(&[0, 0]), Some(&0));
        assert_eq!(chunk.get(&[0, 2]), Some(&2));
        assert_eq!(chunk.get(&[1, 0]), Some(&3));
        assert_eq!(chunk.get(&[1, 2]), Some(&5));
        assert_eq!(chunk.get(&[2, 0]), None);
        assert_eq!(chunk.get(&[0]), None);
    }

    #[test]
    fn chunk_fold() {
        let chunk = Chunk::new(vec![4], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(chunk.fold_left(0, |acc, v| acc * 10 + v), 1234);
        assert_eq!(chunk.fold_right(0, |v, acc| acc * 10 + v), 4321);
    }
}
