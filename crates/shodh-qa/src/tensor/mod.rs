//! Portable tensor records exchanged with the model engine and returned to callers.

pub mod envelope;
pub mod input;
pub mod serializer;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TensorError;

pub use envelope::TensorEnvelope;
pub use input::{build_model_inputs, InputBuilder};
pub use serializer::TensorSerializer;

/// Scalar element type tag carried by every tensor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    #[serde(rename = "FLOAT32")]
    Float32,
    #[serde(rename = "FLOAT64")]
    Float64,
    #[serde(rename = "INT32")]
    Int32,
    #[serde(rename = "INT64")]
    Int64,
    #[serde(rename = "INT8")]
    Int8,
    #[serde(rename = "UINT8")]
    UInt8,
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "STRING")]
    String,
}

impl DataType {
    /// Size in bytes of one element, `None` for strings.
    pub fn element_size(&self) -> Option<usize> {
        match self {
            Self::Float64 | Self::Int64 => Some(8),
            Self::Float32 | Self::Int32 => Some(4),
            Self::Int8 | Self::UInt8 | Self::Boolean => Some(1),
            Self::String => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float32 => "FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Int8 => "INT8",
            Self::UInt8 => "UINT8",
            Self::Boolean => "BOOLEAN",
            Self::String => "STRING",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed flat value buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "values")]
pub enum TensorData {
    #[serde(rename = "FLOAT32")]
    Float32(Vec<f32>),
    #[serde(rename = "FLOAT64")]
    Float64(Vec<f64>),
    #[serde(rename = "INT32")]
    Int32(Vec<i32>),
    #[serde(rename = "INT64")]
    Int64(Vec<i64>),
    #[serde(rename = "INT8")]
    Int8(Vec<i8>),
    #[serde(rename = "UINT8")]
    UInt8(Vec<u8>),
    #[serde(rename = "BOOLEAN")]
    Boolean(Vec<bool>),
}

impl TensorData {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Int8(_) => DataType::Int8,
            Self::UInt8(_) => DataType::UInt8,
            Self::Boolean(_) => DataType::Boolean,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Int8(v) => v.len(),
            Self::UInt8(v) => v.len(),
            Self::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Little-endian raw byte form. Booleans take one byte each (0 or 1).
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Self::Float32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::Float64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::Int32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::Int64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::Int8(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::UInt8(v) => v.clone(),
            Self::Boolean(v) => v.iter().map(|&b| u8::from(b)).collect(),
        }
    }

    /// Decode a little-endian raw buffer under `data_type`.
    pub fn from_le_bytes(
        name: &str,
        data_type: DataType,
        bytes: &[u8],
    ) -> Result<Self, TensorError> {
        let size = data_type
            .element_size()
            .ok_or(TensorError::NotNumeric(data_type))?;
        if bytes.len() % size != 0 {
            return Err(TensorError::ByteLength {
                name: name.to_string(),
                data_type,
                len: bytes.len(),
            });
        }

        Ok(match data_type {
            DataType::Float32 => Self::Float32(decode_le(bytes, f32::from_le_bytes)),
            DataType::Float64 => Self::Float64(decode_le(bytes, f64::from_le_bytes)),
            DataType::Int32 => Self::Int32(decode_le(bytes, i32::from_le_bytes)),
            DataType::Int64 => Self::Int64(decode_le(bytes, i64::from_le_bytes)),
            DataType::Int8 => Self::Int8(decode_le(bytes, i8::from_le_bytes)),
            DataType::UInt8 => Self::UInt8(bytes.to_vec()),
            DataType::Boolean => Self::Boolean(bytes.iter().map(|&b| b != 0).collect()),
            DataType::String => return Err(TensorError::NotNumeric(data_type)),
        })
    }

    /// Integer view of the buffer. Floats have no lossless integer view.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            Self::Int64(v) => Some(v.clone()),
            Self::Int32(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            Self::Int8(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            Self::UInt8(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            Self::Boolean(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            Self::Float32(_) | Self::Float64(_) => None,
        }
    }

    /// Float view of the buffer, used for logits and probabilities.
    pub fn to_f32_vec(&self) -> Option<Vec<f32>> {
        match self {
            Self::Float32(v) => Some(v.clone()),
            Self::Float64(v) => Some(v.iter().map(|&x| x as f32).collect()),
            _ => None,
        }
    }

    /// Bitwise equality; unlike `PartialEq` this treats identical NaN payloads as equal.
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.data_type() == other.data_type() && self.to_le_bytes() == other.to_le_bytes()
    }
}

fn decode_le<const N: usize, T>(bytes: &[u8], convert: fn([u8; N]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(chunk);
            convert(buf)
        })
        .collect()
}

/// A named, shaped, typed tensor record.
///
/// Numeric tensors hold `data`; string tensors (such as the joined `answers`)
/// hold `result` instead and have an empty shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedTensor {
    name: String,
    data_type: DataType,
    shape: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<TensorData>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes"
    )]
    byte_buffer: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<String>,
}

impl NamedTensor {
    /// Build a numeric tensor. Fails when `shape` does not describe `data`.
    pub fn new(
        name: impl Into<String>,
        shape: Vec<usize>,
        data: TensorData,
    ) -> Result<Self, TensorError> {
        let name = name.into();
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(TensorError::ShapeMismatch {
                name,
                shape,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            name,
            data_type: data.data_type(),
            shape,
            data: Some(data),
            byte_buffer: None,
            result: None,
        })
    }

    /// One-dimensional tensor whose shape is its length.
    pub fn vector(name: impl Into<String>, data: TensorData) -> Self {
        Self {
            name: name.into(),
            data_type: data.data_type(),
            shape: vec![data.len()],
            data: Some(data),
            byte_buffer: None,
            result: None,
        }
    }

    /// String-valued tensor.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::String,
            shape: Vec::new(),
            data: None,
            byte_buffer: None,
            result: Some(value.into()),
        }
    }

    /// Decode a raw little-endian buffer; the buffer is kept as the tensor's byte form.
    pub fn from_raw_bytes(
        name: impl Into<String>,
        shape: Vec<usize>,
        data_type: DataType,
        bytes: Vec<u8>,
    ) -> Result<Self, TensorError> {
        let name = name.into();
        let data = TensorData::from_le_bytes(&name, data_type, &bytes)?;
        let mut tensor = Self::new(name, shape, data)?;
        tensor.byte_buffer = Some(bytes);
        Ok(tensor)
    }

    /// Attach the little-endian byte form of the values.
    pub fn with_byte_buffer(mut self) -> Self {
        if let Some(data) = &self.data {
            self.byte_buffer = Some(data.to_le_bytes());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> Option<&TensorData> {
        self.data.as_ref()
    }

    pub fn byte_buffer(&self) -> Option<&[u8]> {
        self.byte_buffer.as_deref()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Number of flat values (0 for string tensors).
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, TensorData::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the record's internal invariants. Needed after deserializing
    /// a record that did not come from one of the constructors. Only string
    /// tensors may omit `data`, and they never carry a byte buffer.
    pub fn validate(&self) -> Result<(), TensorError> {
        if self.data_type == DataType::String {
            if self.byte_buffer.is_some() {
                return Err(TensorError::NotNumeric(DataType::String));
            }
            if self.data.is_none() {
                return Ok(());
            }
        }
        let Some(data) = &self.data else {
            return Err(TensorError::MissingValues {
                name: self.name.clone(),
                data_type: self.data_type,
            });
        };
        if data.data_type() != self.data_type {
            return Err(TensorError::DataTypeMismatch {
                name: self.name.clone(),
                declared: self.data_type,
                actual: data.data_type(),
            });
        }
        let expected: usize = self.shape.iter().product();
        if expected != data.len() {
            return Err(TensorError::ShapeMismatch {
                name: self.name.clone(),
                shape: self.shape.clone(),
                expected,
                actual: data.len(),
            });
        }
        if let Some(bytes) = &self.byte_buffer {
            let decoded = TensorData::from_le_bytes(&self.name, self.data_type, bytes)?;
            if !decoded.bit_eq(data) {
                return Err(TensorError::ByteMismatch(self.name.clone()));
            }
        }
        Ok(())
    }

    /// Split the record into its parts for engines that feed raw buffers.
    pub(crate) fn into_parts(self) -> (String, Vec<usize>, Option<TensorData>) {
        (self.name, self.shape, self.data)
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_str(&STANDARD.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
