//! Typed errors for tensor construction and model-output validation.
//!
//! Tokenizer and engine failures travel as `anyhow::Error` and are never
//! wrapped here; this enum only covers contract violations detected while
//! building or reading tensors.

use crate::tensor::DataType;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TensorError {
    /// Flat value count does not match the product of the declared shape.
    #[error("tensor '{name}': shape {shape:?} expects {expected} values, got {actual}")]
    ShapeMismatch {
        name: String,
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// Raw byte buffer length is not a whole number of elements.
    #[error("tensor '{name}': {len} bytes is not a multiple of the {data_type} element size")]
    ByteLength {
        name: String,
        data_type: DataType,
        len: usize,
    },

    /// Raw byte buffer does not decode to the tensor's values.
    #[error("tensor '{0}': byte buffer does not match tensor values")]
    ByteMismatch(String),

    /// Declared element type disagrees with the stored buffer.
    #[error("tensor '{name}': declared {declared} but data is {actual}")]
    DataTypeMismatch {
        name: String,
        declared: DataType,
        actual: DataType,
    },

    /// A numeric tensor record carries no values.
    #[error("tensor '{name}': {data_type} tensor has no values")]
    MissingValues { name: String, data_type: DataType },

    /// A string-typed tensor cannot be represented as a numeric buffer.
    #[error("{0} tensors have no numeric byte representation")]
    NotNumeric(DataType),

    /// The model returned fewer tensors, or tensors of a different layout, than the task needs.
    #[error("invalid model output: {0}")]
    InvalidModelOutput(String),
}
