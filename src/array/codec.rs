//! Chunk compressors and filters.
//!
//! Zarr v2 encodes each chunk independently: an optional ordered pipeline of
//! filters is applied first, then a primary [`Compressor`] (`blosc`, `zlib`,
//! or none). On read the compressor is undone first, then the filters in
//! reverse order.
//!
//! No concrete filter is required by this crate; a filter pipeline declared
//! in metadata fails with [`CodecError::UnknownFilter`] rather than being
//! silently skipped.

mod blosc;
mod zlib;

use thiserror::Error;

use crate::metadata::CodecMetadata;

pub use blosc::{
    BloscCodec, BloscCodecConfiguration, BloscCompressionLevel, BloscCompressor, BloscError,
    BloscShuffleMode,
};
pub use zlib::{ZlibCodec, ZlibCodecConfiguration, ZlibCompressionLevel};

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An unknown compressor id.
    #[error("unknown compressor id {0:?}")]
    UnknownCompressor(String),
    /// An unknown filter id.
    #[error("unknown filter id {0:?}")]
    UnknownFilter(String),
    /// An invalid codec configuration.
    #[error("invalid {0} codec configuration: {1}")]
    InvalidConfiguration(&'static str, String),
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// The primary compression codec of an array.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Compressor {
    /// No compression: chunk payloads are stored as-is.
    #[default]
    None,
    /// The `zlib` codec.
    Zlib(ZlibCodec),
    /// The `blosc` codec.
    Blosc(BloscCodec),
}

impl Compressor {
    /// Create a compressor from the `compressor` field of array metadata.
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownCompressor`] for an unknown id and
    /// [`CodecError::InvalidConfiguration`] for a bad configuration.
    pub fn from_metadata(metadata: Option<&CodecMetadata>) -> Result<Self, CodecError> {
        let Some(metadata) = metadata else {
            return Ok(Self::None);
        };
        match metadata.id() {
            zlib::IDENTIFIER => Ok(Self::Zlib(ZlibCodec::new_with_configuration(
                &metadata.to_configuration().map_err(|err| {
                    CodecError::InvalidConfiguration(zlib::IDENTIFIER, err.to_string())
                })?,
            ))),
            blosc::IDENTIFIER => Ok(Self::Blosc(BloscCodec::new_with_configuration(
                &metadata.to_configuration().map_err(|err| {
                    CodecError::InvalidConfiguration(blosc::IDENTIFIER, err.to_string())
                })?,
            )?)),
            id => Err(CodecError::UnknownCompressor(id.to_string())),
        }
    }

    /// Create the `compressor` field of array metadata.
    ///
    /// Returns [`None`] for [`Compressor::None`].
    #[must_use]
    pub fn to_metadata(&self) -> Option<CodecMetadata> {
        match self {
            Self::None => None,
            Self::Zlib(codec) => Some(codec.to_metadata()),
            Self::Blosc(codec) => Some(codec.to_metadata()),
        }
    }

    /// Encode a chunk payload.
    ///
    /// `typesize` is the element size hint used by shuffling compressors.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if encoding fails.
    pub fn encode(&self, decoded_value: Vec<u8>, typesize: usize) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::None => Ok(decoded_value),
            Self::Zlib(codec) => codec.encode(&decoded_value),
            Self::Blosc(codec) => codec.encode(&decoded_value, typesize),
        }
    }

    /// Decode a chunk payload of known decoded size.
    ///
    /// The returned bytes are not guaranteed to have `decoded_size` bytes;
    /// callers validate the length of the result.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the payload is corrupt.
    pub fn decode(&self, encoded_value: Vec<u8>, decoded_size: usize) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::None => Ok(encoded_value),
            Self::Zlib(codec) => codec.decode(&encoded_value),
            Self::Blosc(codec) => codec.decode(&encoded_value, decoded_size),
        }
    }
}

/// The filter pipeline of an array.
///
/// Filters are applied in declared order on write and reversed on read. No
/// concrete filter is implemented; the empty pipeline is the identity.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FilterChain {}

impl FilterChain {
    /// Create a filter chain from the `filters` field of array metadata.
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownFilter`] for any declared filter.
    pub fn from_metadata(metadata: Option<&Vec<CodecMetadata>>) -> Result<Self, CodecError> {
        if let Some(filter) = metadata.into_iter().flatten().next() {
            return Err(CodecError::UnknownFilter(filter.id().to_string()));
        }
        Ok(Self {})
    }

    /// Create the `filters` field of array metadata.
    ///
    /// Returns [`None`] for the empty pipeline.
    #[must_use]
    pub fn to_metadata(&self) -> Option<Vec<CodecMetadata>> {
        None
    }

    /// Apply the filters in declared order.
    #[must_use]
    pub fn apply(&self, bytes: Vec<u8>) -> Vec<u8> {
        bytes
    }

    /// Undo the filters in reverse order.
    #[must_use]
    pub fn unapply(&self, bytes: Vec<u8>) -> Vec<u8> {
        bytes
    }
}
