//! Zarr v2 metadata documents.
//!
//! An array directory holds a `.zarray` JSON document ([`ArrayMetadata`])
//! and a group directory holds a `.zgroup` JSON document ([`GroupMetadata`]).
//! Either may be accompanied by a `.zattrs` document holding free-form user
//! attributes.
//!
//! An example `.zarray` document:
//! ```json
//! {
//!     "chunks": [1000, 1000],
//!     "compressor": {
//!         "id": "blosc",
//!         "cname": "lz4",
//!         "clevel": 5,
//!         "shuffle": 1,
//!         "blocksize": 0
//!     },
//!     "dtype": "<f8",
//!     "fill_value": "NaN",
//!     "filters": null,
//!     "order": "C",
//!     "shape": [10000, 10000],
//!     "zarr_format": 2
//! }
//! ```

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An array of integers providing the length of each dimension of an array.
pub type ArrayShape = Vec<u64>;

/// An N-dimensional index into an array.
pub type ArrayIndices = Vec<u64>;

/// Zarr array metadata (storage specification v2, the `.zarray` document).
///
/// User attributes are *not* part of this document; they live in a separate
/// `.zattrs` document.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadata {
    /// An integer defining the version of the storage specification to which the array adheres. Must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
    /// An array of integers providing the length of each dimension of the Zarr array.
    pub shape: ArrayShape,
    /// A list of integers defining the length of each dimension of a chunk of the array.
    pub chunks: ArrayShape,
    /// The data type of the Zarr array.
    pub dtype: DataTypeMetadata,
    /// The primary compression codec, or null if no compressor is to be used.
    pub compressor: Option<CodecMetadata>,
    /// A scalar value to use for uninitialized portions of the array, or null if no fill value is to be used.
    pub fill_value: FillValueMetadata,
    /// Either "C" or "F", defining the layout of bytes within each chunk of the array.
    pub order: Order,
    /// A list of codec configurations, or null if no filters are to be applied.
    #[serde(default)]
    pub filters: Option<Vec<CodecMetadata>>,
    /// Either "." or "/", the separator placed between the dimensions of a chunk key.
    #[serde(default)]
    pub dimension_separator: DimensionSeparator,
}

impl ArrayMetadata {
    /// Validate constraints that the JSON schema alone cannot express.
    ///
    /// # Errors
    /// Returns [`MetadataError`] if the `shape` and `chunks` ranks differ or
    /// any chunk dimension is zero.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.shape.len() != self.chunks.len() {
            return Err(MetadataError::new(format!(
                "shape rank {} does not match chunks rank {}",
                self.shape.len(),
                self.chunks.len()
            )));
        }
        if self.chunks.iter().any(|&c| c == 0) {
            return Err(MetadataError::new(format!(
                "chunk shape {:?} has a zero dimension",
                self.chunks
            )));
        }
        Ok(())
    }
}

/// Zarr v2 group metadata (the `.zgroup` document).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, Default)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct GroupMetadata {
    /// An integer defining the version of the storage specification to which the group adheres. Must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
}

/// A malformed metadata error.
#[derive(Debug, Error)]
#[error("malformed metadata: {0}")]
pub struct MetadataError(String);

impl MetadataError {
    /// Create a new metadata error with a `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// The layout of bytes within each chunk of the array.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Order {
    /// Row-major order. The last dimension varies fastest.
    #[default]
    C,
    /// Column-major order. The first dimension varies fastest.
    F,
}

/// The separator placed between the dimensions of a chunk key.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug, Default, Display)]
pub enum DimensionSeparator {
    /// `.` separator.
    #[serde(rename = ".")]
    #[display(".")]
    #[default]
    Dot,
    /// `/` separator.
    #[serde(rename = "/")]
    #[display("/")]
    Slash,
}

/// Codec metadata with an `id` and a flat configuration.
///
/// This is the form compressors and filters take in a `.zarray` document,
/// for example:
/// ```json
/// {
///     "id": "blosc",
///     "cname": "lz4",
///     "clevel": 5,
///     "shuffle": 1
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct CodecMetadata {
    id: String,
    #[serde(flatten)]
    configuration: serde_json::Map<String, serde_json::Value>,
}

impl CodecMetadata {
    /// Create codec metadata from an `id` and a serializable `configuration`.
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if `configuration` does not serialize to
    /// a JSON object.
    pub fn new_with_serializable_configuration<TConfiguration: Serialize>(
        id: &str,
        configuration: &TConfiguration,
    ) -> Result<Self, serde_json::Error> {
        let configuration = serde_json::to_value(configuration)?;
        if let serde_json::Value::Object(configuration) = configuration {
            Ok(Self {
                id: id.to_string(),
                configuration,
            })
        } else {
            Err(serde::ser::Error::custom(
                "codec configuration is not a JSON object",
            ))
        }
    }

    /// Return the "id" key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the configuration, which includes all fields excluding the "id".
    #[must_use]
    pub fn configuration(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.configuration
    }

    /// Deserialize the configuration into a concrete type.
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if the configuration does not match
    /// `TConfiguration`.
    pub fn to_configuration<'de, TConfiguration: Deserialize<'de>>(
        &self,
    ) -> Result<TConfiguration, serde_json::Error> {
        TConfiguration::deserialize(serde_json::Value::Object(self.configuration.clone()))
    }
}

/// Zarr v2 data type metadata: the `dtype` field of a `.zarray` document.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(untagged)]
pub enum DataTypeMetadata {
    /// A simple data type: a NumPy typestr such as `<f8` or `|u1`.
    Simple(String),
    /// A structured data type: an ordered list of named fields.
    Structured(Vec<StructuredFieldMetadata>),
}

impl core::fmt::Display for DataTypeMetadata {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Simple(typestr) => f.write_str(typestr),
            Self::Structured(_) => {
                f.write_str(&serde_json::to_string(self).unwrap_or_default())
            }
        }
    }
}

/// One field of a structured data type.
///
/// Serialized as a `[name, typestr]` or `[name, typestr, shape]` tuple.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(
    from = "StructuredFieldMetadataTuple",
    into = "StructuredFieldMetadataTuple"
)]
pub struct StructuredFieldMetadata {
    /// Field name.
    pub name: String,
    /// Field data type as a NumPy typestr.
    pub typestr: String,
    /// Optional subarray shape.
    pub shape: Option<Vec<u64>>,
}

#[derive(Serialize, Deserialize)]
struct StructuredFieldMetadataTuple(
    String,
    String,
    #[serde(skip_serializing_if = "Option::is_none")] Option<Vec<u64>>,
);

impl From<StructuredFieldMetadataTuple> for StructuredFieldMetadata {
    fn from(value: StructuredFieldMetadataTuple) -> Self {
        let StructuredFieldMetadataTuple(name, typestr, shape) = value;
        Self {
            name,
            typestr,
            shape,
        }
    }
}

impl From<StructuredFieldMetadata> for StructuredFieldMetadataTuple {
    fn from(value: StructuredFieldMetadata) -> Self {
        Self(value.name, value.typestr, value.shape)
    }
}

/// A scalar value providing the default value to use for uninitialized
/// portions of the array, or null if no fill value is to be used.
///
/// Non-finite floats are encoded as the strings `"NaN"`, `"Infinity"` and
/// `"-Infinity"`; fill values of the `|S` data types are base64-encoded
/// strings; fill values of the `|U` data types are plain strings.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[serde(untagged)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub enum FillValueMetadata {
    /// No fill value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(serde_json::Number),
    /// A string: `"NaN"`/`"Infinity"`/`"-Infinity"` for floats, base64 bytes
    /// for `|S`, a literal string for `|U`.
    String(String),
}

impl Default for FillValueMetadata {
    fn default() -> Self {
        Self::Null
    }
}

/// Metadata of a hierarchy attributes document (`.zattrs`): a free-form JSON object.
pub type AttributesMetadata = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_metadata_json() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"
            {
                "chunks": [1000, 1000],
                "compressor": {
                    "id": "blosc",
                    "cname": "lz4",
                    "clevel": 5,
                    "shuffle": 1
                },
                "dtype": "<f8",
                "fill_value": "NaN",
                "filters": null,
                "order": "F",
                "shape": [10000, 10000],
                "zarr_format": 2,
                "some_unknown_field": true
            }"#;
        let metadata: ArrayMetadata = serde_json::from_str(json)?;
        metadata.validate()?;
        assert_eq!(metadata.shape, vec![10000, 10000]);
        assert_eq!(metadata.chunks, vec![1000, 1000]);
        assert_eq!(metadata.order, Order::F);
        assert_eq!(metadata.dimension_separator, DimensionSeparator::Dot);
        assert_eq!(metadata.fill_value, FillValueMetadata::String("NaN".to_string()));
        let compressor = metadata.compressor.as_ref().unwrap();
        assert_eq!(compressor.id(), "blosc");
        Ok(())
    }

    #[test]
    fn array_metadata_wrong_format() {
        let json = r#"
            {
                "chunks": [2],
                "compressor": null,
                "dtype": "<i4",
                "fill_value": 0,
                "filters": null,
                "order": "C",
                "shape": [4],
                "zarr_format": 3
            }"#;
        assert!(serde_json::from_str::<ArrayMetadata>(json).is_err());
    }

    #[test]
    fn array_metadata_rank_mismatch() {
        let json = r#"
            {
                "chunks": [2, 2],
                "compressor": null,
                "dtype": "<i4",
                "fill_value": 0,
                "filters": null,
                "order": "C",
                "shape": [4],
                "zarr_format": 2
            }"#;
        let metadata: ArrayMetadata = serde_json::from_str(json).unwrap();
        assert!(metadata.validate().is_err());
    }

    #[test]
    fn structured_dtype_json() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"[["a", "<i2"], ["b", "<f4"], ["c", "<u1", [2, 2]]]"#;
        let dtype: DataTypeMetadata = serde_json::from_str(json)?;
        let DataTypeMetadata::Structured(fields) = &dtype else {
            panic!("expected structured dtype");
        };
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name, "a");
        assert_eq!(fields[0].typestr, "<i2");
        assert_eq!(fields[2].shape, Some(vec![2, 2]));
        let round_trip = serde_json::to_string(&dtype)?;
        assert_eq!(round_trip, r#"[["a","<i2"],["b","<f4"],["c","<u1",[2,2]]]"#);
        Ok(())
    }

    #[test]
    fn fill_value_json() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            serde_json::from_str::<FillValueMetadata>("null")?,
            FillValueMetadata::Null
        );
        assert_eq!(
            serde_json::from_str::<FillValueMetadata>("false")?,
            FillValueMetadata::Bool(false)
        );
        assert_eq!(
            serde_json::from_str::<FillValueMetadata>("1.5")?,
            FillValueMetadata::Number(serde_json::Number::from_f64(1.5).unwrap())
        );
        assert_eq!(
            serde_json::from_str::<FillValueMetadata>(r#""-Infinity""#)?,
            FillValueMetadata::String("-Infinity".to_string())
        );
        assert_eq!(serde_json::to_string(&FillValueMetadata::Null)?, "null");
        Ok(())
    }

    #[test]
    fn group_metadata_json() -> Result<(), Box<dyn std::error::Error>> {
        let metadata: GroupMetadata = serde_json::from_str(r#"{"zarr_format": 2}"#)?;
        assert_eq!(serde_json::to_string(&metadata)?, r#"{"zarr_format":2}"#);
        assert!(serde_json::from_str::<GroupMetadata>(r#"{"zarr_format": 3}"#).is_err());
        Ok(())
    }
}
