use super::{NamedTensor, TensorEnvelope};

/// Task-agnostic conversion of engine outputs into a portable envelope.
///
/// Order, names, shapes, element types and values are kept as they are;
/// numeric tensors optionally carry their little-endian byte form.
#[derive(Debug, Clone, Copy)]
pub struct TensorSerializer {
    attach_byte_buffers: bool,
}

impl Default for TensorSerializer {
    fn default() -> Self {
        Self {
            attach_byte_buffers: true,
        }
    }
}

impl TensorSerializer {
    pub fn new(attach_byte_buffers: bool) -> Self {
        Self {
            attach_byte_buffers,
        }
    }

    pub fn serialize<I>(&self, tensors: I) -> TensorEnvelope
    where
        I: IntoIterator<Item = NamedTensor>,
    {
        let tensors: Vec<NamedTensor> = tensors
            .into_iter()
            .map(|t| {
                if self.attach_byte_buffers && t.byte_buffer().is_none() {
                    t.with_byte_buffer()
                } else {
                    t
                }
            })
            .collect();
        tracing::debug!(
            count = tensors.len(),
            with_bytes = self.attach_byte_buffers,
            "[TensorSerializer] Serialized output tensors"
        );
        TensorEnvelope::new(tensors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{DataType, TensorData};

    fn outputs() -> Vec<NamedTensor> {
        vec![
            NamedTensor::new(
                "sentence_embedding",
                vec![1, 4],
                TensorData::Float32(vec![0.1, f32::MIN_POSITIVE, -0.0, f32::NAN]),
            )
            .unwrap(),
            NamedTensor::new("token_count", vec![1], TensorData::Int64(vec![9])).unwrap(),
        ]
    }

    #[test]
    fn test_preserves_order_and_metadata() {
        let env = TensorSerializer::default().serialize(outputs());
        assert_eq!(env.names(), vec!["sentence_embedding", "token_count"]);
        let emb = env.get("sentence_embedding").unwrap();
        assert_eq!(emb.shape(), &[1, 4]);
        assert_eq!(emb.data_type(), DataType::Float32);
    }

    #[test]
    fn test_byte_buffers_decode_bit_for_bit() {
        let originals = outputs();
        let env = TensorSerializer::default().serialize(originals.clone());
        for (tensor, original) in env.tensors.iter().zip(&originals) {
            let bytes = tensor.byte_buffer().unwrap().to_vec();
            let decoded = NamedTensor::from_raw_bytes(
                tensor.name(),
                tensor.shape().to_vec(),
                tensor.data_type(),
                bytes,
            )
            .unwrap();
            assert!(decoded.data().unwrap().bit_eq(original.data().unwrap()));
            assert!(tensor.validate().is_ok());
        }
    }

    #[test]
    fn test_without_byte_buffers() {
        let env = TensorSerializer::new(false).serialize(outputs());
        assert!(env.tensors.iter().all(|t| t.byte_buffer().is_none()));
    }

    #[test]
    fn test_empty_input() {
        assert!(TensorSerializer::default().serialize(Vec::new()).is_empty());
    }
}
