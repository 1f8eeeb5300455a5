//! The `blosc` compressor.
//!
//! Chunk payloads use the [blosc](https://www.blosc.org/) container format,
//! produced and consumed through the c-blosc context API (no global
//! initialization and no shared state).

use std::ffi::c_char;

use blosc_src::{
    blosc_cbuffer_validate, blosc_compress_ctx, blosc_decompress_ctx, blosc_get_complib_info,
    BLOSC_MAX_OVERHEAD,
};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

use crate::metadata::CodecMetadata;

use super::CodecError;

pub(crate) const IDENTIFIER: &str = "blosc";

/// A `blosc` error.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BloscError(String);

impl From<String> for BloscError {
    fn from(err: String) -> Self {
        Self(err)
    }
}

/// An integer from 0 to 9 controlling the compression level.
///
/// A level of 1 is the fastest compression method and produces the least
/// compression, while 9 is slowest and produces the most compression.
/// Compression is turned off when the compression level is 0.
#[derive(Serialize, Copy, Clone, Debug, Eq, PartialEq)]
pub struct BloscCompressionLevel(u8);

impl Default for BloscCompressionLevel {
    fn default() -> Self {
        Self(5)
    }
}

impl From<BloscCompressionLevel> for u8 {
    fn from(val: BloscCompressionLevel) -> Self {
        val.0
    }
}

impl TryFrom<u8> for BloscCompressionLevel {
    type Error = u8;
    fn try_from(level: u8) -> Result<Self, Self::Error> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(level)
        }
    }
}

impl<'de> serde::Deserialize<'de> for BloscCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u8::deserialize(d)?;
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(serde::de::Error::custom("clevel must be between 0 and 9"))
        }
    }
}

/// The `blosc` shuffle mode.
///
/// Encoded in v2 codec metadata as an integer, per numcodecs.
#[derive(Serialize_repr, Deserialize_repr, Copy, Clone, Debug, Eq, PartialEq, Default)]
#[repr(u8)]
pub enum BloscShuffleMode {
    /// No shuffling.
    #[default]
    NoShuffle = 0,
    /// Byte-wise shuffling.
    Shuffle = 1,
    /// Bit-wise shuffling.
    BitShuffle = 2,
}

/// The `blosc` compressor.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BloscCompressor {
    /// [BloscLZ](https://github.com/Blosc/c-blosc/blob/master/blosc/blosclz.h): the blosc default compressor, heavily based on FastLZ.
    BloscLZ,
    /// [LZ4](https://lz4.org/): a compact, very popular and fast compressor.
    #[default]
    LZ4,
    /// [LZ4HC](https://lz4.org/): a tweaked version of LZ4, producing better compression ratios at the expense of speed.
    LZ4HC,
    /// [Snappy](https://github.com/google/snappy): a popular compressor used in many places.
    Snappy,
    /// [Zlib](https://www.zlib.net/): a classic, achieving good compression ratios.
    Zlib,
    /// [Zstd](https://facebook.github.io/zstd/): an extremely well balanced codec.
    Zstd,
}

impl BloscCompressor {
    const fn as_cstr(self) -> *const u8 {
        match self {
            Self::BloscLZ => blosc_src::BLOSC_BLOSCLZ_COMPNAME.as_ptr(),
            Self::LZ4 => blosc_src::BLOSC_LZ4_COMPNAME.as_ptr(),
            Self::LZ4HC => blosc_src::BLOSC_LZ4HC_COMPNAME.as_ptr(),
            Self::Snappy => blosc_src::BLOSC_SNAPPY_COMPNAME.as_ptr(),
            Self::Zlib => blosc_src::BLOSC_ZLIB_COMPNAME.as_ptr(),
            Self::Zstd => blosc_src::BLOSC_ZSTD_COMPNAME.as_ptr(),
        }
    }
}

/// Configuration parameters for the `blosc` codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct BloscCodecConfiguration {
    /// The compressor.
    pub cname: BloscCompressor,
    /// The compression level.
    pub clevel: BloscCompressionLevel,
    /// The shuffle mode. Defaults to no shuffling if unspecified.
    #[serde(default)]
    pub shuffle: BloscShuffleMode,
    /// The compression block size. Automatically determined if 0.
    #[serde(default)]
    pub blocksize: usize,
}

/// A `blosc` codec implementation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BloscCodec {
    cname: BloscCompressor,
    clevel: BloscCompressionLevel,
    shuffle: BloscShuffleMode,
    blocksize: usize,
}

impl BloscCodec {
    /// Create a new `blosc` codec.
    ///
    /// The block size is chosen automatically if `blocksize` is zero.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the compressor is not supported by the
    /// linked blosc library.
    pub fn new(
        cname: BloscCompressor,
        clevel: BloscCompressionLevel,
        shuffle: BloscShuffleMode,
        blocksize: usize,
    ) -> Result<Self, CodecError> {
        // Check that the compressor is available
        let support = unsafe {
            blosc_get_complib_info(
                cname.as_cstr().cast::<c_char>(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        if support < 0 {
            return Err(CodecError::Other(format!(
                "blosc compressor {cname:?} is not supported"
            )));
        }

        Ok(Self {
            cname,
            clevel,
            shuffle,
            blocksize,
        })
    }

    /// Create a new `blosc` codec from configuration.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the configuration is not supported.
    pub fn new_with_configuration(
        configuration: &BloscCodecConfiguration,
    ) -> Result<Self, CodecError> {
        Self::new(
            configuration.cname,
            configuration.clevel,
            configuration.shuffle,
            configuration.blocksize,
        )
    }

    /// Create the codec metadata.
    ///
    /// # Panics
    /// Panics if the configuration does not serialize to a JSON object,
    /// which cannot happen.
    #[must_use]
    pub fn to_metadata(&self) -> CodecMetadata {
        let configuration = BloscCodecConfiguration {
            cname: self.cname,
            clevel: self.clevel,
            shuffle: self.shuffle,
            blocksize: self.blocksize,
        };
        CodecMetadata::new_with_serializable_configuration(IDENTIFIER, &configuration).unwrap()
    }

    /// Compress `decoded_value`.
    ///
    /// `typesize` is the element size in bytes, which configures the shuffle
    /// stride.
    ///
    /// # Errors
    /// Returns a [`CodecError`] on a compression failure.
    pub fn encode(&self, decoded_value: &[u8], typesize: usize) -> Result<Vec<u8>, CodecError> {
        blosc_compress_bytes(
            decoded_value,
            self.clevel,
            self.shuffle,
            typesize,
            self.cname,
            self.blocksize,
        )
        .map_err(|err: BloscError| CodecError::Other(err.to_string()))
    }

    /// Decompress `encoded_value`, expected to hold `decoded_size` bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the payload is not a valid blosc buffer.
    pub fn decode(&self, encoded_value: &[u8], decoded_size: usize) -> Result<Vec<u8>, CodecError> {
        let destsize = blosc_validate(encoded_value)
            .ok_or_else(|| CodecError::from("blosc encoded value is invalid"))?;
        if destsize != decoded_size {
            return Err(CodecError::Other(format!(
                "blosc buffer decompresses to {destsize} bytes, expected {decoded_size}"
            )));
        }
        blosc_decompress_bytes(encoded_value, destsize)
            .map_err(|err| CodecError::Other(err.to_string()))
    }
}

fn blosc_compress_bytes(
    src: &[u8],
    clevel: BloscCompressionLevel,
    shuffle: BloscShuffleMode,
    typesize: usize,
    cname: BloscCompressor,
    blocksize: usize,
) -> Result<Vec<u8>, BloscError> {
    let mut dest = vec![0u8; src.len() + BLOSC_MAX_OVERHEAD as usize];
    let destsize = unsafe {
        blosc_compress_ctx(
            i32::from(u8::from(clevel)),
            shuffle as i32,
            typesize.max(1),
            src.len(),
            src.as_ptr().cast(),
            dest.as_mut_ptr().cast(),
            dest.len(),
            cname.as_cstr().cast::<c_char>(),
            blocksize,
            1,
        )
    };
    if destsize > 0 {
        #[allow(clippy::cast_sign_loss)]
        dest.truncate(destsize as usize);
        Ok(dest)
    } else {
        Err(BloscError::from(format!(
            "blosc_compress_ctx returned {destsize}"
        )))
    }
}

/// Validate a blosc buffer and return its decompressed size.
fn blosc_validate(src: &[u8]) -> Option<usize> {
    let mut destsize: usize = 0;
    let valid =
        unsafe { blosc_cbuffer_validate(src.as_ptr().cast(), src.len(), &mut destsize) } >= 0;
    valid.then_some(destsize)
}

fn blosc_decompress_bytes(src: &[u8], destsize: usize) -> Result<Vec<u8>, BloscError> {
    let mut dest = vec![0u8; destsize];
    let n = unsafe { blosc_decompress_ctx(src.as_ptr().cast(), dest.as_mut_ptr().cast(), destsize, 1) };
    #[allow(clippy::cast_sign_loss)]
    if n >= 0 && n as usize == destsize {
        Ok(dest)
    } else {
        Err(BloscError::from(format!(
            "blosc_decompress_ctx returned {n}, expected {destsize}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_VALID: &str = r#"
    {
        "cname": "lz4",
        "clevel": 5,
        "shuffle": 1,
        "blocksize": 0
    }"#;

    #[test]
    fn codec_blosc_configuration() {
        let configuration: BloscCodecConfiguration = serde_json::from_str(JSON_VALID).unwrap();
        assert_eq!(configuration.cname, BloscCompressor::LZ4);
        assert_eq!(configuration.shuffle, BloscShuffleMode::Shuffle);
        let codec = BloscCodec::new_with_configuration(&configuration).unwrap();
        let metadata = codec.to_metadata();
        assert_eq!(metadata.id(), "blosc");
        assert_eq!(
            metadata.configuration().get("shuffle"),
            Some(&serde_json::Value::from(1))
        );
    }

    #[test]
    fn codec_blosc_invalid_clevel() {
        let json = r#"
        {
            "cname": "lz4",
            "clevel": 10,
            "shuffle": 1,
            "blocksize": 0
        }"#;
        assert!(serde_json::from_str::<BloscCodecConfiguration>(json).is_err());
    }

    #[test]
    fn codec_blosc_round_trip() {
        let configuration: BloscCodecConfiguration = serde_json::from_str(JSON_VALID).unwrap();
        let codec = BloscCodec::new_with_configuration(&configuration).unwrap();
        let bytes: Vec<u8> = (0..255u8).cycle().take(4096).collect();
        let encoded = codec.encode(&bytes, 2).unwrap();
        let decoded = codec.decode(&encoded, bytes.len()).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn codec_blosc_decode_invalid() {
        let configuration: BloscCodecConfiguration = serde_json::from_str(JSON_VALID).unwrap();
        let codec = BloscCodec::new_with_configuration(&configuration).unwrap();
        assert!(codec.decode(&[0, 1, 2], 16).is_err());
    }

    #[test]
    fn codec_blosc_shuffle_modes() {
        for shuffle in [
            BloscShuffleMode::NoShuffle,
            BloscShuffleMode::Shuffle,
            BloscShuffleMode::BitShuffle,
        ] {
            let codec = BloscCodec::new(
                BloscCompressor::BloscLZ,
                BloscCompressionLevel::default(),
                shuffle,
                0,
            )
            .unwrap();
            let bytes: Vec<u8> = (0..64u8).cycle().take(512).collect();
            let encoded = codec.encode(&bytes, 4).unwrap();
            assert_eq!(codec.decode(&encoded, bytes.len()).unwrap(), bytes);
        }
    }
}
