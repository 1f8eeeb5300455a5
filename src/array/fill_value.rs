//! Zarr fill values.
//!
//! A [`FillValue`] holds the byte representation of one element, in the byte
//! order declared by the array's data type. It provides the value assumed
//! for any element not materialized on disk and pads the ragged tail chunks
//! of an array on write.

/// The fill value of a Zarr array.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        FillValue(value)
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        FillValue(vec![u8::from(value)])
    }
}

impl From<u8> for FillValue {
    fn from(value: u8) -> Self {
        FillValue(vec![value])
    }
}

impl From<i8> for FillValue {
    fn from(value: i8) -> Self {
        FillValue(value.to_ne_bytes().to_vec())
    }
}

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> FillValue {
        FillValue(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
