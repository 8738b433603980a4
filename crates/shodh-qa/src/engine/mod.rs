pub mod onnx;

use anyhow::Result;

use crate::tensor::NamedTensor;

pub use onnx::OnnxEngine;

/// Model execution boundary. Blocking; errors are returned to the caller untouched.
pub trait ModelEngine: Send + Sync {
    /// Run the model on the named inputs, returning outputs in the model's declared order.
    fn run(&self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>>;
}
