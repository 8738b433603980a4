use crate::encoding::Encoding;
use crate::error::TensorError;
use crate::types::SemanticUnitMap;

use super::{NamedTensor, TensorData};

pub const INPUT_IDS: &str = "input_ids";
pub const ATTENTION_MASK: &str = "attention_mask";
pub const TOKEN_TYPE_IDS: &str = "token_type_ids";
pub const SENTENCE_IDS: &str = "sentence_ids";

/// Packages an `Encoding` into the named tensors the model consumes: INT64
/// token inputs and an INT32 `sentence_ids`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputBuilder {
    include_token_type_ids: bool,
}

impl InputBuilder {
    pub fn new(include_token_type_ids: bool) -> Self {
        Self {
            include_token_type_ids,
        }
    }

    /// `input_ids`, `attention_mask`, then `token_type_ids` (when enabled) and
    /// `sentence_ids` (when a unit map is given), each of shape `[tokens]`.
    pub fn build(
        &self,
        encoding: &Encoding,
        units: Option<&SemanticUnitMap>,
    ) -> Result<Vec<NamedTensor>, TensorError> {
        let mut tensors = vec![
            NamedTensor::vector(INPUT_IDS, TensorData::Int64(encoding.ids().to_vec())),
            NamedTensor::vector(
                ATTENTION_MASK,
                TensorData::Int64(encoding.attention_mask().to_vec()),
            ),
        ];

        if self.include_token_type_ids {
            tensors.push(NamedTensor::vector(
                TOKEN_TYPE_IDS,
                TensorData::Int64(encoding.type_ids().to_vec()),
            ));
        }

        if let Some(units) = units {
            if units.len() != encoding.len() {
                return Err(TensorError::ShapeMismatch {
                    name: SENTENCE_IDS.to_string(),
                    shape: vec![encoding.len()],
                    expected: encoding.len(),
                    actual: units.len(),
                });
            }
            tensors.push(NamedTensor::vector(
                SENTENCE_IDS,
                TensorData::Int32(units.to_tensor_values()),
            ));
        }

        Ok(tensors)
    }
}

/// Default builder: `input_ids`, `attention_mask` and optional `sentence_ids`.
pub fn build_model_inputs(
    encoding: &Encoding,
    units: Option<&SemanticUnitMap>,
) -> Result<Vec<NamedTensor>, TensorError> {
    InputBuilder::default().build(encoding, units)
}
