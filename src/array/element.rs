//! Array elements.
//!
//! An [`Element`] is a Rust type that can be encoded to and decoded from the
//! byte representation of a [`DataType`], honoring its declared endianness.
//! Fixed-size numeric data types map to native Rust scalars; data types with
//! no native scalar (`|S`, `|U`, structured) are accessed through the
//! dynamic [`Value`] type.

use half::f16;
use num::complex::{Complex32, Complex64};

use super::data_type::{endian_bytes, ne_array, DataType, DataTypeError, StructuredField};
use super::{Endianness, FillValue};

/// A typed array element.
pub trait Element: Sized + Clone {
    /// Returns true if `data_type` describes this element type.
    fn matches_data_type(data_type: &DataType) -> bool;

    /// Encode the element into `bytes`, advancing it by exactly
    /// [`DataType::size`] bytes.
    ///
    /// # Errors
    /// Returns [`DataTypeError`] if the element is incompatible with `data_type`.
    fn encode(&self, data_type: &DataType, bytes: &mut Vec<u8>) -> Result<(), DataTypeError>;

    /// Decode an element from `bytes`, which holds exactly
    /// [`DataType::size`] bytes.
    ///
    /// # Errors
    /// Returns [`DataTypeError`] if the element is incompatible with
    /// `data_type` or `bytes` has the wrong length.
    fn decode(data_type: &DataType, bytes: &[u8]) -> Result<Self, DataTypeError>;

    /// Encode the element as a [`FillValue`].
    ///
    /// # Errors
    /// Returns [`DataTypeError`] if the element is incompatible with `data_type`.
    fn to_fill_value(&self, data_type: &DataType) -> Result<FillValue, DataTypeError> {
        let mut bytes = Vec::with_capacity(data_type.size());
        self.encode(data_type, &mut bytes)?;
        Ok(FillValue::new(bytes))
    }
}

fn incompatible(data_type: &DataType) -> DataTypeError {
    DataTypeError::IncompatibleValue(data_type.to_string())
}

fn check_size(data_type: &DataType, bytes: &[u8]) -> Result<(), DataTypeError> {
    if bytes.len() == data_type.size() {
        Ok(())
    } else {
        Err(DataTypeError::WidthMismatch {
            data_type: data_type.to_string(),
            data_type_size: data_type.size(),
            value_size: bytes.len(),
        })
    }
}

impl Element for bool {
    fn matches_data_type(data_type: &DataType) -> bool {
        matches!(data_type, DataType::Bool)
    }

    fn encode(&self, data_type: &DataType, bytes: &mut Vec<u8>) -> Result<(), DataTypeError> {
        if !Self::matches_data_type(data_type) {
            return Err(incompatible(data_type));
        }
        bytes.push(u8::from(*self));
        Ok(())
    }

    fn decode(data_type: &DataType, bytes: &[u8]) -> Result<Self, DataTypeError> {
        if !Self::matches_data_type(data_type) {
            return Err(incompatible(data_type));
        }
        check_size(data_type, bytes)?;
        Ok(bytes[0] != 0)
    }
}

macro_rules! impl_element_single_byte {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            fn matches_data_type(data_type: &DataType) -> bool {
                matches!(data_type, DataType::$variant)
            }

            fn encode(
                &self,
                data_type: &DataType,
                bytes: &mut Vec<u8>,
            ) -> Result<(), DataTypeError> {
                if !Self::matches_data_type(data_type) {
                    return Err(incompatible(data_type));
                }
                bytes.extend(self.to_ne_bytes());
                Ok(())
            }

            fn decode(data_type: &DataType, bytes: &[u8]) -> Result<Self, DataTypeError> {
                if !Self::matches_data_type(data_type) {
                    return Err(incompatible(data_type));
                }
                check_size(data_type, bytes)?;
                Ok(Self::from_ne_bytes([bytes[0]]))
            }
        }
    };
}

impl_element_single_byte!(i8, Int8);
impl_element_single_byte!(u8, UInt8);

macro_rules! impl_element_multi_byte {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            fn matches_data_type(data_type: &DataType) -> bool {
                matches!(data_type, DataType::$variant(_))
            }

            fn encode(
                &self,
                data_type: &DataType,
                bytes: &mut Vec<u8>,
            ) -> Result<(), DataTypeError> {
                let DataType::$variant(endianness) = data_type else {
                    return Err(incompatible(data_type));
                };
                bytes.extend(endian_bytes(&self.to_ne_bytes(), *endianness));
                Ok(())
            }

            fn decode(data_type: &DataType, bytes: &[u8]) -> Result<Self, DataTypeError> {
                let DataType::$variant(endianness) = data_type else {
                    return Err(incompatible(data_type));
                };
                check_size(data_type, bytes)?;
                Ok(Self::from_ne_bytes(ne_array(bytes, *endianness)))
            }
        }
    };
}

impl_element_multi_byte!(i16, Int16);
impl_element_multi_byte!(i32, Int32);
impl_element_multi_byte!(i64, Int64);
impl_element_multi_byte!(u16, UInt16);
impl_element_multi_byte!(u32, UInt32);
impl_element_multi_byte!(u64, UInt64);
impl_element_multi_byte!(f16, Float16);
impl_element_multi_byte!(f32, Float32);
impl_element_multi_byte!(f64, Float64);

macro_rules! impl_element_complex {
    ($ty:ty, $component:ty, $variant:ident) => {
        impl Element for $ty {
            fn matches_data_type(data_type: &DataType) -> bool {
                matches!(data_type, DataType::$variant(_))
            }

            fn encode(
                &self,
                data_type: &DataType,
                bytes: &mut Vec<u8>,
            ) -> Result<(), DataTypeError> {
                let DataType::$variant(endianness) = data_type else {
                    return Err(incompatible(data_type));
                };
                bytes.extend(endian_bytes(&self.re.to_ne_bytes(), *endianness));
                bytes.extend(endian_bytes(&self.im.to_ne_bytes(), *endianness));
                Ok(())
            }

            fn decode(data_type: &DataType, bytes: &[u8]) -> Result<Self, DataTypeError> {
                let DataType::$variant(endianness) = data_type else {
                    return Err(incompatible(data_type));
                };
                check_size(data_type, bytes)?;
                let half = bytes.len() / 2;
                let re = <$component>::from_ne_bytes(ne_array(&bytes[..half], *endianness));
                let im = <$component>::from_ne_bytes(ne_array(&bytes[half..], *endianness));
                Ok(Self::new(re, im))
            }
        }
    };
}

impl_element_complex!(Complex32, f32, Complex64);
impl_element_complex!(Complex64, f64, Complex128);

/// A dynamically typed array element.
///
/// [`Value`] can represent an element of any [`DataType`], including those
/// with no native Rust scalar: fixed-length bytes, fixed-length unicode, and
/// structured data types.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// An 8-bit signed integer.
    Int8(i8),
    /// A 16-bit signed integer.
    Int16(i16),
    /// A 32-bit signed integer.
    Int32(i32),
    /// A 64-bit signed integer.
    Int64(i64),
    /// An 8-bit unsigned integer.
    UInt8(u8),
    /// A 16-bit unsigned integer.
    UInt16(u16),
    /// A 32-bit unsigned integer.
    UInt32(u32),
    /// A 64-bit unsigned integer.
    UInt64(u64),
    /// A half-precision float.
    Float16(f16),
    /// A single-precision float.
    Float32(f32),
    /// A double-precision float.
    Float64(f64),
    /// A complex number with single-precision components.
    Complex64(Complex32),
    /// A complex number with double-precision components.
    Complex128(Complex64),
    /// A byte sequence for the `|S` data types, at most the declared length.
    Bytes(Vec<u8>),
    /// A string for the `|U` data types, at most the declared length.
    Unicode(String),
    /// The values of one structured field with a subarray shape.
    List(Vec<Value>),
    /// A structured value, one entry per field.
    Struct(Vec<Value>),
}

impl Element for Value {
    fn matches_data_type(_data_type: &DataType) -> bool {
        true
    }

    fn encode(&self, data_type: &DataType, bytes: &mut Vec<u8>) -> Result<(), DataTypeError> {
        match (self, data_type) {
            (Self::Bool(v), DataType::Bool) => v.encode(data_type, bytes),
            (Self::Int8(v), DataType::Int8) => v.encode(data_type, bytes),
            (Self::Int16(v), DataType::Int16(_)) => v.encode(data_type, bytes),
            (Self::Int32(v), DataType::Int32(_)) => v.encode(data_type, bytes),
            (Self::Int64(v), DataType::Int64(_)) => v.encode(data_type, bytes),
            (Self::UInt8(v), DataType::UInt8) => v.encode(data_type, bytes),
            (Self::UInt16(v), DataType::UInt16(_)) => v.encode(data_type, bytes),
            (Self::UInt32(v), DataType::UInt32(_)) => v.encode(data_type, bytes),
            (Self::UInt64(v), DataType::UInt64(_)) => v.encode(data_type, bytes),
            (Self::Float16(v), DataType::Float16(_)) => v.encode(data_type, bytes),
            (Self::Float32(v), DataType::Float32(_)) => v.encode(data_type, bytes),
            (Self::Float64(v), DataType::Float64(_)) => v.encode(data_type, bytes),
            (Self::Complex64(v), DataType::Complex64(_)) => v.encode(data_type, bytes),
            (Self::Complex128(v), DataType::Complex128(_)) => v.encode(data_type, bytes),
            (Self::Bytes(v), DataType::Bytes(size)) => {
                if v.len() > *size {
                    return Err(DataTypeError::WidthMismatch {
                        data_type: data_type.to_string(),
                        data_type_size: *size,
                        value_size: v.len(),
                    });
                }
                bytes.extend(v);
                bytes.extend(std::iter::repeat(0u8).take(size - v.len()));
                Ok(())
            }
            (Self::Unicode(v), DataType::Unicode(len, endianness)) => {
                encode_ucs4(v, *len, *endianness, data_type, bytes)
            }
            (Self::Struct(values), DataType::Structured(fields)) => {
                if values.len() != fields.len() {
                    return Err(incompatible(data_type));
                }
                for (value, field) in std::iter::zip(values, fields) {
                    encode_field(value, field, data_type, bytes)?;
                }
                Ok(())
            }
            _ => Err(incompatible(data_type)),
        }
    }

    fn decode(data_type: &DataType, bytes: &[u8]) -> Result<Self, DataTypeError> {
        check_size(data_type, bytes)?;
        match data_type {
            DataType::Bool => bool::decode(data_type, bytes).map(Self::Bool),
            DataType::Int8 => i8::decode(data_type, bytes).map(Self::Int8),
            DataType::Int16(_) => i16::decode(data_type, bytes).map(Self::Int16),
            DataType::Int32(_) => i32::decode(data_type, bytes).map(Self::Int32),
            DataType::Int64(_) => i64::decode(data_type, bytes).map(Self::Int64),
            DataType::UInt8 => u8::decode(data_type, bytes).map(Self::UInt8),
            DataType::UInt16(_) => u16::decode(data_type, bytes).map(Self::UInt16),
            DataType::UInt32(_) => u32::decode(data_type, bytes).map(Self::UInt32),
            DataType::UInt64(_) => u64::decode(data_type, bytes).map(Self::UInt64),
            DataType::Float16(_) => f16::decode(data_type, bytes).map(Self::Float16),
            DataType::Float32(_) => f32::decode(data_type, bytes).map(Self::Float32),
            DataType::Float64(_) => f64::decode(data_type, bytes).map(Self::Float64),
            DataType::Complex64(_) => Complex32::decode(data_type, bytes).map(Self::Complex64),
            DataType::Complex128(_) => Complex64::decode(data_type, bytes).map(Self::Complex128),
            DataType::Bytes(_) => Ok(Self::Bytes(bytes.to_vec())),
            DataType::Unicode(len, endianness) => {
                Ok(Self::Unicode(decode_ucs4(bytes, *len, *endianness)))
            }
            DataType::Structured(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                let mut offset = 0;
                for field in fields {
                    let field_size = field.size();
                    let field_bytes = &bytes[offset..offset + field_size];
                    values.push(decode_field(field, field_bytes)?);
                    offset += field_size;
                }
                Ok(Self::Struct(values))
            }
        }
    }
}

fn encode_field(
    value: &Value,
    field: &StructuredField,
    data_type: &DataType,
    bytes: &mut Vec<u8>,
) -> Result<(), DataTypeError> {
    if field.shape.is_empty() {
        value.encode(&field.data_type, bytes)
    } else {
        let Value::List(values) = value else {
            return Err(incompatible(data_type));
        };
        if values.len() != field.num_values() {
            return Err(incompatible(data_type));
        }
        for value in values {
            value.encode(&field.data_type, bytes)?;
        }
        Ok(())
    }
}

fn decode_field(field: &StructuredField, bytes: &[u8]) -> Result<Value, DataTypeError> {
    if field.shape.is_empty() {
        Value::decode(&field.data_type, bytes)
    } else {
        let value_size = field.data_type.size();
        let values = bytes
            .chunks_exact(value_size)
            .map(|value_bytes| Value::decode(&field.data_type, value_bytes))
            .collect::<Result<Vec<_>, DataTypeError>>()?;
        Ok(Value::List(values))
    }
}

fn encode_ucs4(
    string: &str,
    len: usize,
    endianness: Endianness,
    data_type: &DataType,
    bytes: &mut Vec<u8>,
) -> Result<(), DataTypeError> {
    let num_chars = string.chars().count();
    if num_chars > len {
        return Err(DataTypeError::WidthMismatch {
            data_type: data_type.to_string(),
            data_type_size: len * 4,
            value_size: num_chars * 4,
        });
    }
    for ch in string.chars().chain(std::iter::repeat('\0')).take(len) {
        bytes.extend(endian_bytes(&(ch as u32).to_ne_bytes(), endianness));
    }
    Ok(())
}

fn decode_ucs4(bytes: &[u8], len: usize, endianness: Endianness) -> String {
    let mut string = String::with_capacity(len);
    for chunk in bytes.chunks_exact(4) {
        let code = u32::from_ne_bytes(ne_array(chunk, endianness));
        if code == 0 {
            break;
        }
        string.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    string
}
