//! The `zlib` compressor.

use std::io::{Cursor, Read};

use serde::{Deserialize, Serialize};

use crate::metadata::CodecMetadata;

use super::CodecError;

pub(crate) const IDENTIFIER: &str = "zlib";

/// An integer from 0 to 9 controlling the `zlib` compression level.
#[derive(Serialize, Copy, Clone, Debug, Eq, PartialEq)]
pub struct ZlibCompressionLevel(u32);

impl Default for ZlibCompressionLevel {
    fn default() -> Self {
        Self(1)
    }
}

impl From<ZlibCompressionLevel> for u32 {
    fn from(val: ZlibCompressionLevel) -> Self {
        val.0
    }
}

impl TryFrom<u32> for ZlibCompressionLevel {
    type Error = u32;
    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(level)
        }
    }
}

impl<'de> serde::Deserialize<'de> for ZlibCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u32::deserialize(d)?;
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(serde::de::Error::custom("level must be between 0 and 9"))
        }
    }
}

/// Configuration parameters for the `zlib` codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct ZlibCodecConfiguration {
    /// The compression level.
    pub level: ZlibCompressionLevel,
}

/// A `zlib` codec implementation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ZlibCodec {
    compression_level: ZlibCompressionLevel,
}

impl ZlibCodec {
    /// Create a new `zlib` codec.
    #[must_use]
    pub const fn new(compression_level: ZlibCompressionLevel) -> Self {
        Self { compression_level }
    }

    /// Create a new `zlib` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &ZlibCodecConfiguration) -> Self {
        Self {
            compression_level: configuration.level,
        }
    }

    /// Create the codec metadata.
    ///
    /// # Panics
    /// Panics if the configuration does not serialize to a JSON object,
    /// which cannot happen.
    #[must_use]
    pub fn to_metadata(&self) -> CodecMetadata {
        let configuration = ZlibCodecConfiguration {
            level: self.compression_level,
        };
        CodecMetadata::new_with_serializable_configuration(IDENTIFIER, &configuration).unwrap()
    }

    /// Compress `decoded_value`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] on a compression failure.
    pub fn encode(&self, decoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = flate2::read::ZlibEncoder::new(
            Cursor::new(decoded_value),
            flate2::Compression::new(self.compression_level.into()),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    /// Decompress `encoded_value`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the payload is not a valid zlib stream.
    pub fn decode(&self, encoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut decoder = flate2::read::ZlibDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_zlib_round_trip() {
        let configuration: ZlibCodecConfiguration =
            serde_json::from_str(r#"{"level": 5}"#).unwrap();
        let codec = ZlibCodec::new_with_configuration(&configuration);
        let bytes: Vec<u8> = (0..64u8).cycle().take(1024).collect();
        let encoded = codec.encode(&bytes).unwrap();
        assert!(encoded.len() < bytes.len());
        assert_eq!(codec.decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn codec_zlib_invalid_level() {
        assert!(serde_json::from_str::<ZlibCodecConfiguration>(r#"{"level": 10}"#).is_err());
    }

    #[test]
    fn codec_zlib_corrupt() {
        let codec = ZlibCodec::new(ZlibCompressionLevel::default());
        assert!(codec.decode(&[1, 2, 3]).is_err());
    }
}
