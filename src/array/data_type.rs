//! Zarr v2 data types.
//!
//! A [`DataType`] describes one array element: its logical kind, byte width
//! and, for multi-byte types, endianness. Data types round-trip through the
//! NumPy typestr grammar used by the `dtype` metadata field (`<f8`, `>i4`,
//! `|u1`, `|S10`, structured `[[name, typestr], …]`).

use base64::{prelude::BASE64_STANDARD, Engine};
use half::f16;
use thiserror::Error;

use crate::metadata::{DataTypeMetadata, FillValueMetadata, StructuredFieldMetadata};

use super::{Endianness, FillValue};

/// A data type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DataType {
    /// `|b1` Boolean.
    Bool,
    /// `|i1` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `i2` Integer in `[-2^15, 2^15-1]`.
    Int16(Endianness),
    /// `i4` Integer in `[-2^31, 2^31-1]`.
    Int32(Endianness),
    /// `i8` Integer in `[-2^63, 2^63-1]`.
    Int64(Endianness),
    /// `|u1` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `u2` Integer in `[0, 2^16-1]`.
    UInt16(Endianness),
    /// `u4` Integer in `[0, 2^32-1]`.
    UInt32(Endianness),
    /// `u8` Integer in `[0, 2^64-1]`.
    UInt64(Endianness),
    /// `f2` IEEE 754 half-precision floating point.
    Float16(Endianness),
    /// `f4` IEEE 754 single-precision floating point.
    Float32(Endianness),
    /// `f8` IEEE 754 double-precision floating point.
    Float64(Endianness),
    /// `c8` Complex number with single-precision components.
    Complex64(Endianness),
    /// `c16` Complex number with double-precision components.
    Complex128(Endianness),
    /// `|S<n>` Fixed-length sequence of `n` bytes.
    Bytes(usize),
    /// `U<n>` Fixed-length sequence of `n` UCS-4 code points.
    Unicode(usize, Endianness),
    /// A structured data type: an ordered sequence of named fields with no padding.
    Structured(Vec<StructuredField>),
}

/// One named field of a structured data type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredField {
    /// The field name.
    pub name: String,
    /// The field data type. Nested structured fields are not supported.
    pub data_type: DataType,
    /// The subarray shape; the field holds `shape.product()` values.
    pub shape: Vec<u64>,
}

impl StructuredField {
    /// Create a new scalar structured field.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            shape: vec![],
        }
    }

    /// The number of values held by this field.
    #[must_use]
    pub fn num_values(&self) -> usize {
        usize::try_from(self.shape.iter().product::<u64>()).unwrap_or(usize::MAX)
    }

    /// The size of this field in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data_type.size() * self.num_values()
    }
}

/// An unknown or unsupported typestr error.
#[derive(Debug, Error)]
#[error("unknown dtype typestr {0:?}")]
pub struct UnknownTypestrError(String);

/// A data type error.
#[derive(Debug, Error)]
pub enum DataTypeError {
    /// The typestr is unknown or unsupported.
    #[error(transparent)]
    UnknownTypestr(#[from] UnknownTypestrError),
    /// An element value's natural width disagrees with the declared width.
    #[error("width mismatch for {data_type}: value is {value_size} bytes, data type is {data_type_size}")]
    WidthMismatch {
        /// The declared data type.
        data_type: String,
        /// The declared data type size in bytes.
        data_type_size: usize,
        /// The actual value size in bytes.
        value_size: usize,
    },
    /// An element value is incompatible with the data type.
    #[error("incompatible value for data type {0}")]
    IncompatibleValue(String),
    /// A fill value is incompatible with the data type.
    #[error("incompatible fill value {1} for data type {0}")]
    IncompatibleFillValue(String, FillValueMetadata),
    /// The byte buffer is too short for the data type.
    #[error("buffer of {0} bytes is too short for data type {1}")]
    ShortBuffer(usize, String),
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_metadata())
    }
}

impl DataType {
    /// Returns the size of one element in bytes.
    ///
    /// Structured data types are the sum of their field sizes (no padding).
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16(_) | Self::UInt16(_) | Self::Float16(_) => 2,
            Self::Int32(_) | Self::UInt32(_) | Self::Float32(_) => 4,
            Self::Int64(_) | Self::UInt64(_) | Self::Float64(_) | Self::Complex64(_) => 8,
            Self::Complex128(_) => 16,
            Self::Bytes(size) => *size,
            Self::Unicode(len, _) => len * 4,
            Self::Structured(fields) => fields.iter().map(StructuredField::size).sum(),
        }
    }

    /// Returns the endianness of the data type, or [`None`] where it is not applicable.
    #[must_use]
    pub fn endianness(&self) -> Option<Endianness> {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 | Self::Bytes(_) | Self::Structured(_) => None,
            Self::Int16(e)
            | Self::Int32(e)
            | Self::Int64(e)
            | Self::UInt16(e)
            | Self::UInt32(e)
            | Self::UInt64(e)
            | Self::Float16(e)
            | Self::Float32(e)
            | Self::Float64(e)
            | Self::Complex64(e)
            | Self::Complex128(e)
            | Self::Unicode(_, e) => Some(*e),
        }
    }

    /// Returns the NumPy typestr of the data type.
    ///
    /// Structured data types have no typestr; their metadata form is a list
    /// of fields, see [`DataType::to_metadata`].
    #[must_use]
    pub fn to_typestr(&self) -> Option<String> {
        let simple = |kind: char, width: usize, endianness: Option<Endianness>| {
            let prefix = endianness.map_or('|', Endianness::prefix);
            format!("{prefix}{kind}{width}")
        };
        match self {
            Self::Bool => Some(simple('b', 1, None)),
            Self::Int8 => Some(simple('i', 1, None)),
            Self::UInt8 => Some(simple('u', 1, None)),
            Self::Int16(e) => Some(simple('i', 2, Some(*e))),
            Self::Int32(e) => Some(simple('i', 4, Some(*e))),
            Self::Int64(e) => Some(simple('i', 8, Some(*e))),
            Self::UInt16(e) => Some(simple('u', 2, Some(*e))),
            Self::UInt32(e) => Some(simple('u', 4, Some(*e))),
            Self::UInt64(e) => Some(simple('u', 8, Some(*e))),
            Self::Float16(e) => Some(simple('f', 2, Some(*e))),
            Self::Float32(e) => Some(simple('f', 4, Some(*e))),
            Self::Float64(e) => Some(simple('f', 8, Some(*e))),
            Self::Complex64(e) => Some(simple('c', 8, Some(*e))),
            Self::Complex128(e) => Some(simple('c', 16, Some(*e))),
            Self::Bytes(size) => Some(format!("|S{size}")),
            Self::Unicode(len, e) => Some(format!("{}U{len}", e.prefix())),
            Self::Structured(_) => None,
        }
    }

    /// Create a data type from a NumPy typestr.
    ///
    /// # Errors
    /// Returns [`UnknownTypestrError`] if the typestr is not supported.
    pub fn from_typestr(typestr: &str) -> Result<Self, UnknownTypestrError> {
        let err = || UnknownTypestrError(typestr.to_string());
        let mut chars = typestr.chars();
        let order = match chars.next().ok_or_else(err)? {
            '<' => Some(Endianness::Little),
            '>' => Some(Endianness::Big),
            '|' => None,
            _ => return Err(err()),
        };
        let kind = chars.next().ok_or_else(err)?;
        let width: usize = chars.as_str().parse().map_err(|_| err())?;

        // Single byte kinds ignore the byte order character, as NumPy does.
        match (kind, width) {
            ('S' | 'U', 0) => Err(err()),
            ('b', 1) => Ok(Self::Bool),
            ('i', 1) => Ok(Self::Int8),
            ('u', 1) => Ok(Self::UInt8),
            ('S', _) => Ok(Self::Bytes(width)),
            _ => {
                let order = order.ok_or_else(err)?;
                match (kind, width) {
                    ('i', 2) => Ok(Self::Int16(order)),
                    ('i', 4) => Ok(Self::Int32(order)),
                    ('i', 8) => Ok(Self::Int64(order)),
                    ('u', 2) => Ok(Self::UInt16(order)),
                    ('u', 4) => Ok(Self::UInt32(order)),
                    ('u', 8) => Ok(Self::UInt64(order)),
                    ('f', 2) => Ok(Self::Float16(order)),
                    ('f', 4) => Ok(Self::Float32(order)),
                    ('f', 8) => Ok(Self::Float64(order)),
                    ('c', 8) => Ok(Self::Complex64(order)),
                    ('c', 16) => Ok(Self::Complex128(order)),
                    ('U', _) => Ok(Self::Unicode(width, order)),
                    _ => Err(err()),
                }
            }
        }
    }

    /// Returns the metadata form of the data type.
    #[must_use]
    pub fn to_metadata(&self) -> DataTypeMetadata {
        match self {
            Self::Structured(fields) => DataTypeMetadata::Structured(
                fields
                    .iter()
                    .map(|field| StructuredFieldMetadata {
                        name: field.name.clone(),
                        // The field data type is non-structured, so a typestr exists.
                        typestr: field.data_type.to_typestr().unwrap_or_default(),
                        shape: if field.shape.is_empty() {
                            None
                        } else {
                            Some(field.shape.clone())
                        },
                    })
                    .collect(),
            ),
            _ => DataTypeMetadata::Simple(self.to_typestr().unwrap_or_default()),
        }
    }

    /// Create a data type from metadata.
    ///
    /// # Errors
    /// Returns [`UnknownTypestrError`] if a typestr is not supported or a
    /// structured field is itself structured.
    pub fn from_metadata(metadata: &DataTypeMetadata) -> Result<Self, UnknownTypestrError> {
        match metadata {
            DataTypeMetadata::Simple(typestr) => Self::from_typestr(typestr),
            DataTypeMetadata::Structured(fields) => {
                if fields.is_empty() {
                    return Err(UnknownTypestrError("[]".to_string()));
                }
                Ok(Self::Structured(
                    fields
                        .iter()
                        .map(|field| {
                            Ok(StructuredField {
                                name: field.name.clone(),
                                data_type: Self::from_typestr(&field.typestr)?,
                                shape: field.shape.clone().unwrap_or_default(),
                            })
                        })
                        .collect::<Result<Vec<_>, UnknownTypestrError>>()?,
                ))
            }
        }
    }

    /// Create a fill value from fill value metadata.
    ///
    /// Returns [`None`] for a null fill value.
    ///
    /// # Errors
    /// Returns [`DataTypeError::IncompatibleFillValue`] if the metadata is
    /// incompatible with the data type.
    pub fn fill_value_from_metadata(
        &self,
        metadata: &FillValueMetadata,
    ) -> Result<Option<FillValue>, DataTypeError> {
        if matches!(metadata, FillValueMetadata::Null) {
            return Ok(None);
        }
        let incompatible =
            || DataTypeError::IncompatibleFillValue(self.to_string(), metadata.clone());
        let fill_value = match self {
            Self::Bool => match metadata {
                FillValueMetadata::Bool(b) => FillValue::from(*b),
                FillValueMetadata::Number(n) => {
                    FillValue::from(n.as_u64().ok_or_else(incompatible)? != 0)
                }
                _ => return Err(incompatible()),
            },
            Self::Int8 | Self::Int16(_) | Self::Int32(_) | Self::Int64(_) => {
                let FillValueMetadata::Number(number) = metadata else {
                    return Err(incompatible());
                };
                let int = number.as_i64().ok_or_else(incompatible)?;
                self.int_fill_value(int).ok_or_else(incompatible)?
            }
            Self::UInt8 | Self::UInt16(_) | Self::UInt32(_) | Self::UInt64(_) => {
                let FillValueMetadata::Number(number) = metadata else {
                    return Err(incompatible());
                };
                let uint = number.as_u64().ok_or_else(incompatible)?;
                self.uint_fill_value(uint).ok_or_else(incompatible)?
            }
            Self::Float16(e) | Self::Float32(e) | Self::Float64(e) => {
                let float = match metadata {
                    FillValueMetadata::Number(number) => {
                        number.as_f64().ok_or_else(incompatible)?
                    }
                    FillValueMetadata::String(string) => match string.as_str() {
                        "NaN" => f64::NAN,
                        "Infinity" => f64::INFINITY,
                        "-Infinity" => f64::NEG_INFINITY,
                        _ => return Err(incompatible()),
                    },
                    _ => return Err(incompatible()),
                };
                match self {
                    Self::Float16(_) => {
                        FillValue::new(endian_bytes(&f16::from_f64(float).to_ne_bytes(), *e))
                    }
                    Self::Float32(_) => {
                        #[allow(clippy::cast_possible_truncation)]
                        FillValue::new(endian_bytes(&(float as f32).to_ne_bytes(), *e))
                    }
                    _ => FillValue::new(endian_bytes(&float.to_ne_bytes(), *e)),
                }
            }
            Self::Complex64(e) => {
                let FillValueMetadata::Number(number) = metadata else {
                    return Err(incompatible());
                };
                #[allow(clippy::cast_possible_truncation)]
                let re = number.as_f64().ok_or_else(incompatible)? as f32;
                let mut bytes = endian_bytes(&re.to_ne_bytes(), *e);
                bytes.extend(endian_bytes(&0f32.to_ne_bytes(), *e));
                FillValue::new(bytes)
            }
            Self::Complex128(e) => {
                let FillValueMetadata::Number(number) = metadata else {
                    return Err(incompatible());
                };
                let re = number.as_f64().ok_or_else(incompatible)?;
                let mut bytes = endian_bytes(&re.to_ne_bytes(), *e);
                bytes.extend(endian_bytes(&0f64.to_ne_bytes(), *e));
                FillValue::new(bytes)
            }
            Self::Bytes(size) => {
                let FillValueMetadata::String(string) = metadata else {
                    return Err(incompatible());
                };
                let mut bytes = BASE64_STANDARD
                    .decode(string)
                    .map_err(|_| incompatible())?;
                if bytes.len() > *size {
                    return Err(incompatible());
                }
                bytes.resize(*size, 0);
                FillValue::new(bytes)
            }
            Self::Unicode(len, e) => {
                let FillValueMetadata::String(string) = metadata else {
                    return Err(incompatible());
                };
                if string.chars().count() > *len {
                    return Err(incompatible());
                }
                let mut bytes = Vec::with_capacity(len * 4);
                for ch in string.chars().chain(std::iter::repeat('\0')).take(*len) {
                    bytes.extend(endian_bytes(&(ch as u32).to_ne_bytes(), *e));
                }
                FillValue::new(bytes)
            }
            Self::Structured(_) => return Err(incompatible()),
        };
        Ok(Some(fill_value))
    }

    fn int_fill_value(&self, int: i64) -> Option<FillValue> {
        match self {
            Self::Int8 => i8::try_from(int).ok().map(FillValue::from),
            Self::Int16(e) => i16::try_from(int)
                .ok()
                .map(|v| FillValue::new(endian_bytes(&v.to_ne_bytes(), *e))),
            Self::Int32(e) => i32::try_from(int)
                .ok()
                .map(|v| FillValue::new(endian_bytes(&v.to_ne_bytes(), *e))),
            Self::Int64(e) => Some(FillValue::new(endian_bytes(&int.to_ne_bytes(), *e))),
            _ => None,
        }
    }

    fn uint_fill_value(&self, uint: u64) -> Option<FillValue> {
        match self {
            Self::UInt8 => u8::try_from(uint).ok().map(FillValue::from),
            Self::UInt16(e) => u16::try_from(uint)
                .ok()
                .map(|v| FillValue::new(endian_bytes(&v.to_ne_bytes(), *e))),
            Self::UInt32(e) => u32::try_from(uint)
                .ok()
                .map(|v| FillValue::new(endian_bytes(&v.to_ne_bytes(), *e))),
            Self::UInt64(e) => Some(FillValue::new(endian_bytes(&uint.to_ne_bytes(), *e))),
            _ => None,
        }
    }

    /// Return the fill value metadata for a [`FillValue`].
    ///
    /// # Errors
    /// Returns [`DataTypeError::WidthMismatch`] if the fill value size does
    /// not match the data type size, or
    /// [`DataTypeError::IncompatibleValue`] for data types whose fill values
    /// have no metadata form (structured).
    pub fn metadata_fill_value(
        &self,
        fill_value: &FillValue,
    ) -> Result<FillValueMetadata, DataTypeError> {
        let bytes = fill_value.as_bytes();
        if bytes.len() != self.size() {
            return Err(DataTypeError::WidthMismatch {
                data_type: self.to_string(),
                data_type_size: self.size(),
                value_size: bytes.len(),
            });
        }
        let float_metadata = |float: f64| {
            if float.is_nan() {
                FillValueMetadata::String("NaN".to_string())
            } else if float == f64::INFINITY {
                FillValueMetadata::String("Infinity".to_string())
            } else if float == f64::NEG_INFINITY {
                FillValueMetadata::String("-Infinity".to_string())
            } else {
                serde_json::Number::from_f64(float)
                    .map_or(FillValueMetadata::Null, FillValueMetadata::Number)
            }
        };
        Ok(match self {
            Self::Bool => FillValueMetadata::Bool(bytes[0] != 0),
            Self::Int8 => FillValueMetadata::Number(serde_json::Number::from(
                i8::from_ne_bytes([bytes[0]]),
            )),
            Self::UInt8 => FillValueMetadata::Number(serde_json::Number::from(bytes[0])),
            Self::Int16(e) => FillValueMetadata::Number(serde_json::Number::from(
                i16::from_ne_bytes(ne_array(bytes, *e)),
            )),
            Self::Int32(e) => FillValueMetadata::Number(serde_json::Number::from(
                i32::from_ne_bytes(ne_array(bytes, *e)),
            )),
            Self::Int64(e) => FillValueMetadata::Number(serde_json::Number::from(
                i64::from_ne_bytes(ne_array(bytes, *e)),
            )),
            Self::UInt16(e) => FillValueMetadata::Number(serde_json::Number::from(
                u16::from_ne_bytes(ne_array(bytes, *e)),
            )),
            Self::UInt32(e) => FillValueMetadata::Number(serde_json::Number::from(
                u32::from_ne_bytes(ne_array(bytes, *e)),
            )),
            Self::UInt64(e) => FillValueMetadata::Number(serde_json::Number::from(
                u64::from_ne_bytes(ne_array(bytes, *e)),
            )),
            Self::Float16(e) => {
                float_metadata(f16::from_ne_bytes(ne_array(bytes, *e)).to_f64())
            }
            Self::Float32(e) => {
                float_metadata(f64::from(f32::from_ne_bytes(ne_array(bytes, *e))))
            }
            Self::Float64(e) => float_metadata(f64::from_ne_bytes(ne_array(bytes, *e))),
            Self::Complex64(e) => {
                float_metadata(f64::from(f32::from_ne_bytes(ne_array(&bytes[..4], *e))))
            }
            Self::Complex128(e) => float_metadata(f64::from_ne_bytes(ne_array(&bytes[..8], *e))),
            Self::Bytes(_) => FillValueMetadata::String(BASE64_STANDARD.encode(bytes)),
            Self::Unicode(len, e) => {
                let mut string = String::with_capacity(*len);
                for chunk in bytes.chunks_exact(4) {
                    let code = u32::from_ne_bytes(ne_array(chunk, *e));
                    if code == 0 {
                        break;
                    }
                    string.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                FillValueMetadata::String(string)
            }
            Self::Structured(_) => {
                return Err(DataTypeError::IncompatibleValue(self.to_string()))
            }
        })
    }
}

/// Reorder native-endian bytes to the declared `endianness`.
pub(crate) fn endian_bytes(ne_bytes: &[u8], endianness: Endianness) -> Vec<u8> {
    let native_is_little = cfg!(target_endian = "little");
    let matches_native = match endianness {
        Endianness::Little => native_is_little,
        Endianness::Big => !native_is_little,
    };
    if matches_native {
        ne_bytes.to_vec()
    } else {
        ne_bytes.iter().rev().copied().collect()
    }
}

/// Reorder declared-endianness bytes into a native-endian array.
///
/// # Panics
/// Panics if `bytes.len() != N`; callers are expected to slice exactly.
pub(crate) fn ne_array<const N: usize>(bytes: &[u8], endianness: Endianness) -> [u8; N] {
    let mut array: [u8; N] = bytes.try_into().expect("caller slices exactly N bytes");
    let native_is_little = cfg!(target_endian = "little");
    let matches_native = match endianness {
        Endianness::Little => native_is_little,
        Endianness::Big => !native_is_little,
    };
    if !matches_native {
        array.reverse();
    }
    array
}
