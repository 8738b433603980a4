use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::NamedTensor;

/// Ordered collection of result tensors handed back to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TensorEnvelope {
    pub tensors: Vec<NamedTensor>,
}

impl TensorEnvelope {
    pub fn new(tensors: Vec<NamedTensor>) -> Self {
        Self { tensors }
    }

    pub fn push(&mut self, tensor: NamedTensor) {
        self.tensors.push(tensor);
    }

    /// First tensor with the given name.
    pub fn get(&self, name: &str) -> Option<&NamedTensor> {
        self.tensors.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tensors.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// JSON wire form; byte buffers are base64 encoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| anyhow!("Failed to serialize tensor envelope: {}", e))
    }

    /// Parse the wire form and re-check every tensor's invariants.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: Self = serde_json::from_slice(bytes)
            .map_err(|e| anyhow!("Failed to parse tensor envelope: {}", e))?;
        for tensor in &envelope.tensors {
            tensor.validate()?;
        }
        Ok(envelope)
    }
}
