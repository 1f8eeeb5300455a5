//! Zarr arrays.
//!
//! An [`Array`] is a logical N-dimensional array: metadata, optional user
//! attributes, and a chunk-major grid of in-memory [`Chunk`]s. Arrays are
//! immutable once constructed; they are created from user elements with an
//! [`ArrayBuilder`], persisted with [`Array::save`], and read back with
//! [`Array::load`].
//!
//! On disk, an array directory holds:
//! ```text
//! <array>/
//!   .zarray         JSON metadata
//!   .zattrs         optional JSON attributes
//!   <i0>.<i1>...    one file per chunk, compressed payload
//! ```
//!
//! Chunk payloads are laid out per the array `order`: `C` traverses the
//! last axis fastest, `F` the first. A chunk on the ragged edge of the array
//! is written full-size, padded with the fill value (zero bytes when the
//! fill value is null). A chunk file missing on read yields a chunk of fill
//! values rather than an error.

mod chunk;
pub mod chunk_grid;
pub mod codec;
pub mod data_type;
mod element;
mod endianness;
mod fill_value;

use thiserror::Error;

pub use chunk::{Chunk, InvalidChunkShapeError};
pub use data_type::{DataType, DataTypeError, StructuredField, UnknownTypestrError};
pub use element::{Element, Value};
pub use endianness::Endianness;
pub use fill_value::FillValue;

use chunk_grid::{ChunkGrid, ChunkGridCreateError};
use codec::{CodecError, Compressor, FilterChain};

use crate::{
    array_subset::{c_strides, f_strides, ravel_indices, ArraySubset},
    metadata::{
        ArrayIndices, ArrayMetadata, ArrayShape, AttributesMetadata, DimensionSeparator,
        FillValueMetadata, MetadataError, Order,
    },
    node::{NodePath, NodePathError},
    storage::{
        data_key, meta_key_array, meta_key_attributes, ReadableStorageTraits, StorageError,
        WritableStorageTraits,
    },
};

/// The default target for one chunk when deriving a chunk shape: 32 MiB.
pub const DEFAULT_CHUNK_TARGET_BYTES: u64 = 32 * 1024 * 1024;

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// Array metadata (`.zarray`) is missing.
    #[error("array metadata is missing")]
    MissingMetadata,
    /// Invalid metadata.
    #[error(transparent)]
    MetadataError(#[from] MetadataError),
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// A data type error.
    #[error(transparent)]
    DataTypeError(#[from] DataTypeError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// A chunk grid error.
    #[error(transparent)]
    ChunkGridCreateError(#[from] ChunkGridCreateError),
    /// The element type does not match the array data type.
    #[error("element type does not match array data type {0}")]
    IncompatibleElementType(String),
    /// The number of elements does not match the array shape.
    #[error("expected {expected} elements for the array shape, got {got}")]
    InvalidElementCount {
        /// The number of elements implied by the shape.
        expected: u64,
        /// The number of elements supplied.
        got: usize,
    },
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An array operation error.
    #[error(transparent)]
    ArrayError(#[from] ArrayError),
}

/// An array operation error.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// An index is outside the array shape.
    #[error("index {indices:?} is out of bounds of array shape {shape:?}")]
    IndexOutOfBounds {
        /// The requested index.
        indices: ArrayIndices,
        /// The array shape.
        shape: ArrayShape,
    },
    /// A chunk payload failed to decompress or decode.
    #[error("chunk {key} is corrupt: {reason}")]
    ChunkCorrupt {
        /// The chunk key.
        key: String,
        /// The failure cause.
        reason: String,
    },
    /// Invalid metadata.
    #[error(transparent)]
    MetadataError(#[from] MetadataError),
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// A data type error.
    #[error(transparent)]
    DataTypeError(#[from] DataTypeError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// A Zarr v2 array.
///
/// An array holds its metadata, optional user attributes, and every chunk in
/// chunk-major linear order. The chunk grid shape is
/// `ceil(shape[i] / chunks[i])` per dimension `i`; chunks on the ragged edge
/// hold only their logically valid region.
///
/// The element type `T` must match the array data type: a typed array is
/// obtained from a store with e.g. `Array::<i32>::load(&store, "/path")`,
/// which fails if the `.zarray` dtype is not a 32-bit signed integer. The
/// dynamic [`Value`] element type matches every data type.
#[derive(Clone, Debug, PartialEq)]
pub struct Array<T> {
    metadata: ArrayMetadata,
    data_type: DataType,
    compressor: Compressor,
    filters: FilterChain,
    fill_value: Option<FillValue>,
    attributes: Option<AttributesMetadata>,
    chunk_grid: ChunkGrid,
    chunks: Vec<Chunk<T>>,
}

impl<T: Element> Array<T> {
    /// Create an [`ArrayBuilder`] for an array of `shape` and `data_type`.
    #[must_use]
    pub fn builder(shape: ArrayShape, data_type: DataType) -> ArrayBuilder<T> {
        ArrayBuilder::new(shape, data_type)
    }

    /// Create an array from `elements` in row-major order, with default
    /// chunking, no compression and no fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if `elements` does not match `shape`
    /// or `data_type`.
    pub fn from_elements(
        shape: ArrayShape,
        data_type: DataType,
        elements: Vec<T>,
    ) -> Result<Self, ArrayCreateError> {
        Self::builder(shape, data_type).build(elements)
    }

    /// Load the array at `path` in `storage`.
    ///
    /// Reads and validates `.zarray`, reads the optional `.zattrs`, then
    /// materializes every chunk of the grid. A missing chunk file yields a
    /// chunk of fill values; when the fill value is null, missing chunks
    /// decode from zero bytes.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if:
    ///  - `.zarray` is absent ([`ArrayCreateError::MissingMetadata`]),
    ///  - the metadata is malformed, names an unknown dtype, compressor or
    ///    filter, or does not match the element type `T`, or
    ///  - a chunk payload is corrupt or the store fails.
    pub fn load<TStorage: ?Sized + ReadableStorageTraits>(
        storage: &TStorage,
        path: &str,
    ) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;

        let metadata_key = meta_key_array(&path);
        let metadata = storage
            .get(&metadata_key)?
            .ok_or(ArrayCreateError::MissingMetadata)?;
        let metadata: ArrayMetadata = serde_json::from_slice(&metadata)
            .map_err(|err| StorageError::InvalidMetadata(metadata_key, err.to_string()))?;
        metadata.validate()?;

        let data_type =
            DataType::from_metadata(&metadata.dtype).map_err(DataTypeError::UnknownTypestr)?;
        if !T::matches_data_type(&data_type) {
            return Err(ArrayCreateError::IncompatibleElementType(
                data_type.to_string(),
            ));
        }
        let compressor = Compressor::from_metadata(metadata.compressor.as_ref())?;
        let filters = FilterChain::from_metadata(metadata.filters.as_ref())?;
        let fill_value = data_type.fill_value_from_metadata(&metadata.fill_value)?;
        let chunk_grid = ChunkGrid::new(metadata.shape.clone(), metadata.chunks.clone())?;

        let attributes_key = meta_key_attributes(&path);
        let attributes = storage
            .get(&attributes_key)?
            .map(|bytes| {
                serde_json::from_slice::<AttributesMetadata>(&bytes)
                    .map_err(|err| StorageError::InvalidMetadata(attributes_key, err.to_string()))
            })
            .transpose()?;

        let num_chunks = usize::try_from(chunk_grid.num_chunks()).map_err(|_| {
            MetadataError::new(format!(
                "chunk grid {:?} has more chunks than fit in memory",
                chunk_grid.grid_shape()
            ))
        })?;
        let mut chunks = Vec::with_capacity(num_chunks);
        for chunk_index in 0..chunk_grid.num_chunks() {
            let chunk_indices = chunk_grid.chunk_indices(chunk_index);
            let chunk = retrieve_chunk(
                storage,
                &path,
                &metadata,
                &data_type,
                &compressor,
                &filters,
                fill_value.as_ref(),
                &chunk_grid,
                &chunk_indices,
            )?;
            chunks.push(chunk);
        }

        Ok(Self {
            metadata,
            data_type,
            compressor,
            filters,
            fill_value,
            attributes,
            chunk_grid,
            chunks,
        })
    }

    /// Save the array under `path` in `storage`.
    ///
    /// Writes `.zarray` first, then `.zattrs` if attributes are present,
    /// then every chunk in chunk-major linear order. There is no
    /// transactional guarantee: a failed save may leave a partial directory
    /// behind, and cleanup is the caller's responsibility.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] on the first failing write or encode.
    pub fn save<TStorage: ?Sized + WritableStorageTraits>(
        &self,
        storage: &TStorage,
        path: &str,
    ) -> Result<(), ArrayError> {
        let path = NodePath::new(path)?;

        let metadata = serde_json::to_vec_pretty(&self.metadata)
            .map_err(|err| MetadataError::new(err.to_string()))?;
        storage.set(&meta_key_array(&path), &metadata)?;

        if let Some(attributes) = &self.attributes {
            let attributes = serde_json::to_vec_pretty(attributes)
                .map_err(|err| MetadataError::new(err.to_string()))?;
            storage.set(&meta_key_attributes(&path), &attributes)?;
        }

        for (chunk_index, chunk) in self.chunks.iter().enumerate() {
            let chunk_indices = self.chunk_grid.chunk_indices(chunk_index as u64);
            let key = self
                .chunk_grid
                .chunk_key(&chunk_indices, self.metadata.dimension_separator);
            let decoded = self.encode_chunk(chunk)?;
            let decoded = self.filters.apply(decoded);
            let encoded = self.compressor.encode(decoded, self.data_type.size())?;
            storage.set(&data_key(&path, &key), &encoded)?;
        }
        Ok(())
    }

    /// Encode one chunk into a full-size payload buffer.
    ///
    /// The buffer holds `data_type.size() * chunks.product()` bytes,
    /// prefilled with the fill value (zero when null) and overwritten with
    /// the chunk's valid region in the traversal order given by `order`.
    fn encode_chunk(&self, chunk: &Chunk<T>) -> Result<Vec<u8>, ArrayError> {
        let element_size = self.data_type.size();
        let num_elements = usize::try_from(self.chunk_grid.chunk_num_elements())
            .map_err(|_| MetadataError::new("chunk does not fit in memory".to_string()))?;
        let mut buffer = vec![0u8; element_size * num_elements];
        if let Some(fill_value) = &self.fill_value {
            for slot in buffer.chunks_exact_mut(element_size) {
                slot.copy_from_slice(fill_value.as_bytes());
            }
        }

        let strides = self.order_strides();
        let valid = ArraySubset::new_with_shape(chunk.shape().to_vec());
        let mut scratch = Vec::with_capacity(element_size);
        for (element, local_indices) in std::iter::zip(chunk.elements(), valid.indices()) {
            let position = linear_position(&local_indices, &strides);
            scratch.clear();
            element.encode(&self.data_type, &mut scratch)?;
            buffer[position * element_size..(position + 1) * element_size]
                .copy_from_slice(&scratch);
        }
        Ok(buffer)
    }

    /// Strides mapping in-chunk indices to payload element positions, per
    /// the array `order`.
    fn order_strides(&self) -> Vec<u64> {
        match self.metadata.order {
            Order::C => c_strides(&self.metadata.chunks),
            Order::F => f_strides(&self.metadata.chunks),
        }
    }

    /// Return the element at an N-dimensional index.
    ///
    /// # Errors
    /// Returns [`ArrayError::IndexOutOfBounds`] if `indices` is outside the
    /// array shape.
    pub fn get(&self, indices: &[u64]) -> Result<&T, ArrayError> {
        let out_of_bounds = || ArrayError::IndexOutOfBounds {
            indices: indices.to_vec(),
            shape: self.metadata.shape.clone(),
        };
        if indices.len() != self.metadata.shape.len()
            || std::iter::zip(indices, &self.metadata.shape).any(|(index, dim)| index >= dim)
        {
            return Err(out_of_bounds());
        }
        let chunk_indices: ArrayIndices = std::iter::zip(indices, &self.metadata.chunks)
            .map(|(index, chunk)| index / chunk)
            .collect();
        let local_indices: ArrayIndices = std::iter::zip(indices, &self.metadata.chunks)
            .map(|(index, chunk)| index % chunk)
            .collect();
        let chunk_index =
            usize::try_from(ravel_indices(&chunk_indices, self.chunk_grid.grid_shape()))
                .map_err(|_| out_of_bounds())?;
        self.chunks
            .get(chunk_index)
            .and_then(|chunk| chunk.get(&local_indices))
            .ok_or_else(out_of_bounds)
    }

    /// Return all elements in logical row-major order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let mut elements = Vec::with_capacity(self.num_elements());
        for indices in ArraySubset::new_with_shape(self.metadata.shape.clone()).indices() {
            if let Ok(element) = self.get(&indices) {
                elements.push(element.clone());
            }
        }
        elements
    }

    /// Fold every element left-to-right in canonical order: chunk-major over
    /// the grid, row-major within each chunk.
    pub fn fold_left<B, F: FnMut(B, &T) -> B>(&self, init: B, mut f: F) -> B {
        self.chunks
            .iter()
            .fold(init, |acc, chunk| chunk.fold_left(acc, &mut f))
    }

    /// Fold every element right-to-left in canonical order.
    pub fn fold_right<B, F: FnMut(&T, B) -> B>(&self, init: B, mut f: F) -> B {
        self.chunks
            .iter()
            .rev()
            .fold(init, |acc, chunk| chunk.fold_right(acc, &mut f))
    }

    /// Iterate over every element in canonical order: chunk-major over the
    /// grid, row-major within each chunk.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.chunks.iter().flat_map(|chunk| chunk.elements().iter())
    }
}

impl<T> Array<T> {
    /// Return the array metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }

    /// Return the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.metadata.shape
    }

    /// Return the number of elements of the array.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        usize::try_from(self.metadata.shape.iter().product::<u64>()).unwrap_or(usize::MAX)
    }

    /// Return the data type of the array.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Return the fill value of the array, if any.
    #[must_use]
    pub const fn fill_value(&self) -> Option<&FillValue> {
        self.fill_value.as_ref()
    }

    /// Return the chunk grid of the array.
    #[must_use]
    pub const fn chunk_grid(&self) -> &ChunkGrid {
        &self.chunk_grid
    }

    /// Return the user attributes, if any.
    #[must_use]
    pub const fn attributes(&self) -> Option<&AttributesMetadata> {
        self.attributes.as_ref()
    }

    /// Return the chunks in chunk-major linear order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk<T>] {
        &self.chunks
    }
}

/// Read and decode one chunk, or synthesize a fill-value chunk if its file
/// is absent.
#[allow(clippy::too_many_arguments)]
fn retrieve_chunk<T: Element, TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
    metadata: &ArrayMetadata,
    data_type: &DataType,
    compressor: &Compressor,
    filters: &FilterChain,
    fill_value: Option<&FillValue>,
    chunk_grid: &ChunkGrid,
    chunk_indices: &[u64],
) -> Result<Chunk<T>, ArrayError> {
    let key = chunk_grid.chunk_key(chunk_indices, metadata.dimension_separator);
    let valid = chunk_grid
        .chunk_subset_bounded(chunk_indices)
        .map_err(|err| MetadataError::new(err.to_string()))?;
    let element_size = data_type.size();

    let corrupt = |reason: String| ArrayError::ChunkCorrupt {
        key: key.clone(),
        reason,
    };

    let Some(encoded) = storage.get(&data_key(path, &key))? else {
        // Missing chunk files mean "all fill value"; a null fill decodes
        // from zero bytes.
        let fill_bytes = fill_value.map_or_else(|| vec![0u8; element_size], |f| f.as_bytes().to_vec());
        let element = T::decode(data_type, &fill_bytes)?;
        let num_elements = valid.num_elements_usize();
        return Chunk::new(valid.shape().to_vec(), vec![element; num_elements])
            .map_err(|err| corrupt(err.to_string()));
    };

    let decoded_size = element_size
        * usize::try_from(chunk_grid.chunk_num_elements())
            .map_err(|_| MetadataError::new("chunk does not fit in memory".to_string()))?;
    let decoded = compressor
        .decode(encoded, decoded_size)
        .map_err(|err| corrupt(err.to_string()))?;
    let decoded = filters.unapply(decoded);
    if decoded.len() != decoded_size {
        return Err(corrupt(format!(
            "payload is {} bytes, expected {decoded_size}",
            decoded.len()
        )));
    }

    let strides = match metadata.order {
        Order::C => c_strides(&metadata.chunks),
        Order::F => f_strides(&metadata.chunks),
    };
    let mut elements = Vec::with_capacity(valid.num_elements_usize());
    for local_indices in ArraySubset::new_with_shape(valid.shape().to_vec()).indices() {
        let position = linear_position(&local_indices, &strides);
        let element_bytes = &decoded[position * element_size..(position + 1) * element_size];
        elements.push(T::decode(data_type, element_bytes).map_err(|err| corrupt(err.to_string()))?);
    }
    Chunk::new(valid.shape().to_vec(), elements).map_err(|err| corrupt(err.to_string()))
}

fn linear_position(indices: &[u64], strides: &[u64]) -> usize {
    usize::try_from(
        std::iter::zip(indices, strides)
            .map(|(index, stride)| index * stride)
            .sum::<u64>(),
    )
    .unwrap_or(usize::MAX)
}

/// A builder for an [`Array`].
///
/// Configures chunking, compression, byte layout, fill value and attributes
/// before partitioning a flat vector of elements into chunks:
///
/// ```
/// # use zarr2::array::{Array, ArrayBuilder, DataType, Endianness};
/// let array: Array<i32> = ArrayBuilder::new(vec![6], DataType::Int32(Endianness::Little))
///     .chunk_shape(vec![3])
///     .fill_value(0)
///     .build(vec![1, 2, 3, 4, 5, 6])
///     .unwrap();
/// assert_eq!(array.chunk_grid().grid_shape(), &[2]);
/// ```
#[derive(Debug)]
pub struct ArrayBuilder<T> {
    shape: ArrayShape,
    data_type: DataType,
    chunk_shape: Option<ArrayShape>,
    compressor: Compressor,
    order: Order,
    dimension_separator: DimensionSeparator,
    fill_value: Option<T>,
    attributes: Option<AttributesMetadata>,
}

impl<T: Element> ArrayBuilder<T> {
    /// Create a new builder for an array of `shape` and `data_type`.
    #[must_use]
    pub fn new(shape: ArrayShape, data_type: DataType) -> Self {
        Self {
            shape,
            data_type,
            chunk_shape: None,
            compressor: Compressor::None,
            order: Order::C,
            dimension_separator: DimensionSeparator::Dot,
            fill_value: None,
            attributes: None,
        }
    }

    /// Set the chunk shape.
    ///
    /// If unset, the array is chunked along the first axis only, targeting
    /// [`DEFAULT_CHUNK_TARGET_BYTES`] per chunk.
    #[must_use]
    pub fn chunk_shape(mut self, chunk_shape: ArrayShape) -> Self {
        self.chunk_shape = Some(chunk_shape);
        self
    }

    /// Set the compressor. The default is no compression.
    #[must_use]
    pub fn compressor(mut self, compressor: Compressor) -> Self {
        self.compressor = compressor;
        self
    }

    /// Set the chunk byte layout. The default is [`Order::C`].
    #[must_use]
    pub const fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Set the dimension separator of chunk keys. The default is `.`.
    #[must_use]
    pub const fn dimension_separator(mut self, separator: DimensionSeparator) -> Self {
        self.dimension_separator = separator;
        self
    }

    /// Set the fill value. The default is no fill value.
    #[must_use]
    pub fn fill_value(mut self, fill_value: T) -> Self {
        self.fill_value = Some(fill_value);
        self
    }

    /// Set the user attributes, persisted as `.zattrs`.
    #[must_use]
    pub fn attributes(mut self, attributes: AttributesMetadata) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Build the array from `elements` in row-major order.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the element type, element count,
    /// chunk shape or fill value is incompatible with the array shape and
    /// data type.
    pub fn build(self, elements: Vec<T>) -> Result<Array<T>, ArrayCreateError> {
        if !T::matches_data_type(&self.data_type) {
            return Err(ArrayCreateError::IncompatibleElementType(
                self.data_type.to_string(),
            ));
        }
        let expected = self.shape.iter().product::<u64>();
        if usize::try_from(expected) != Ok(elements.len()) {
            return Err(ArrayCreateError::InvalidElementCount {
                expected,
                got: elements.len(),
            });
        }

        let chunk_shape = match self.chunk_shape {
            Some(chunk_shape) => chunk_shape,
            None => default_chunk_shape(&self.shape, self.data_type.size()),
        };
        let chunk_grid = ChunkGrid::new(self.shape.clone(), chunk_shape.clone())?;

        let fill_value = self
            .fill_value
            .as_ref()
            .map(|fill| fill.to_fill_value(&self.data_type))
            .transpose()?;
        let fill_value_metadata = fill_value
            .as_ref()
            .map(|fill| self.data_type.metadata_fill_value(fill))
            .transpose()?
            .unwrap_or(FillValueMetadata::Null);

        let metadata = ArrayMetadata {
            zarr_format: monostate::MustBe!(2u64),
            shape: self.shape,
            chunks: chunk_shape,
            dtype: self.data_type.to_metadata(),
            compressor: self.compressor.to_metadata(),
            fill_value: fill_value_metadata,
            order: self.order,
            filters: None,
            dimension_separator: self.dimension_separator,
        };
        metadata.validate()?;

        // Partition the elements into chunks in chunk-major order.
        let num_chunks = usize::try_from(chunk_grid.num_chunks())
            .map_err(|_| MetadataError::new("chunk grid does not fit in memory".to_string()))?;
        let mut chunks = Vec::with_capacity(num_chunks);
        for chunk_index in 0..chunk_grid.num_chunks() {
            let chunk_indices = chunk_grid.chunk_indices(chunk_index);
            let valid = chunk_grid
                .chunk_subset_bounded(&chunk_indices)
                .map_err(|err| MetadataError::new(err.to_string()))?;
            let mut chunk_elements = Vec::with_capacity(valid.num_elements_usize());
            for indices in valid.indices() {
                let linear = usize::try_from(ravel_indices(&indices, &metadata.shape))
                    .map_err(|_| MetadataError::new("array does not fit in memory".to_string()))?;
                chunk_elements.push(elements[linear].clone());
            }
            chunks.push(
                Chunk::new(valid.shape().to_vec(), chunk_elements)
                    .map_err(|err| MetadataError::new(err.to_string()))?,
            );
        }

        Ok(Array {
            metadata,
            data_type: self.data_type,
            compressor: self.compressor,
            filters: FilterChain::default(),
            fill_value,
            attributes: self.attributes,
            chunk_grid,
            chunks,
        })
    }
}

/// Derive a chunk shape for an array: chunk along the first axis only, such
/// that one chunk holds at most `DEFAULT_CHUNK_TARGET_BYTES` (and at least
/// one row).
fn default_chunk_shape(shape: &[u64], element_size: usize) -> ArrayShape {
    let Some((&rows, rest)) = shape.split_first() else {
        return vec![];
    };
    let row_elements = rest.iter().product::<u64>().max(1);
    let row_bytes = row_elements * element_size.max(1) as u64;
    let rows_per_chunk = (DEFAULT_CHUNK_TARGET_BYTES / row_bytes).max(1);
    let mut chunk_shape = Vec::with_capacity(shape.len());
    chunk_shape.push(rows_per_chunk.min(rows).max(1));
    chunk_shape.extend(rest.iter().map(|&dim| dim.max(1)));
    chunk_shape
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chunk_shapes() {
        // 4-byte elements: 8 MiB rows fit 4 to a chunk.
        let shape = vec![100, 1024, 2048];
        assert_eq!(default_chunk_shape(&shape, 4), vec![4, 1024, 2048]);
        // Small arrays are a single chunk.
        assert_eq!(default_chunk_shape(&[6], 4), vec![6]);
        // Huge rows still chunk one row at a time.
        assert_eq!(default_chunk_shape(&[10, 64 * 1024 * 1024], 1), vec![1, 64 * 1024 * 1024]);
        // Rank-0 arrays have an empty chunk shape.
        assert_eq!(default_chunk_shape(&[], 8), Vec::<u64>::new());
        // Zero-length dimensions still get non-zero chunks.
        assert_eq!(default_chunk_shape(&[0, 0], 8), vec![1, 1]);
    }

    #[test]
    fn builder_partitions_chunks() {
        let array: Array<u8> = ArrayBuilder::new(vec![2, 3], DataType::UInt8)
            .chunk_shape(vec![2, 2])
            .build(vec![0, 1, 2, 3, 4, 5])
            .unwrap();
        assert_eq!(array.chunk_grid().grid_shape(), &[1, 2]);
        assert_eq!(array.chunks()[0].elements(), &[0, 1, 3, 4]);
        assert_eq!(array.chunks()[1].elements(), &[2, 5]);
        assert_eq!(array.to_vec(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn builder_checks_element_count() {
        let result: Result<Array<u8>, _> =
            ArrayBuilder::new(vec![4], DataType::UInt8).build(vec![0; 3]);
        assert!(matches!(
            result,
            Err(ArrayCreateError::InvalidElementCount {
                expected: 4,
                got: 3
            })
        ));
    }

    #[test]
    fn builder_checks_element_type() {
        let result: Result<Array<u8>, _> =
            ArrayBuilder::new(vec![4], DataType::Int32(Endianness::Little)).build(vec![0; 4]);
        assert!(matches!(
            result,
            Err(ArrayCreateError::IncompatibleElementType(_))
        ));
    }

    #[test]
    fn array_get_and_fold() {
        let array: Array<i32> = ArrayBuilder::new(vec![4], DataType::Int32(Endianness::Little))
            .chunk_shape(vec![3])
            .build(vec![1, 2, 3, 4])
            .unwrap();
        assert_eq!(array.get(&[0]).unwrap(), &1);
        assert_eq!(array.get(&[3]).unwrap(), &4);
        assert!(matches!(
            array.get(&[4]),
            Err(ArrayError::IndexOutOfBounds { .. })
        ));
        assert_eq!(array.fold_left(0, |acc, v| acc * 10 + v), 1234);
        assert_eq!(array.fold_right(0, |v, acc| acc * 10 + v), 4321);
        assert_eq!(array.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn rank_0_array() {
        let array: Array<f64> = ArrayBuilder::new(vec![], DataType::Float64(Endianness::Little))
            .build(vec![42.0])
            .unwrap();
        assert_eq!(array.num_elements(), 1);
        assert_eq!(array.get(&[]).unwrap(), &42.0);
        assert_eq!(array.chunk_grid().num_chunks(), 1);
    }
}
