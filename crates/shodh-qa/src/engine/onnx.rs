use anyhow::{anyhow, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{DynValue, Value};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ModelEngine;
use crate::tensor::{NamedTensor, TensorData};

/// ONNX Runtime session behind the model execution boundary.
///
/// Inputs are fed with a leading batch axis of 1, and a leading axis of 1 is
/// removed again from multi-dimensional outputs.
pub struct OnnxEngine {
    session: Arc<Mutex<Session>>,
    input_names: Vec<String>,
}

impl OnnxEngine {
    pub fn new(model_dir: &Path) -> Result<Self> {
        let model_path = Self::find_model(model_dir)?;
        let model_bytes = std::fs::read(&model_path)
            .map_err(|e| anyhow!("Failed to read model: {:?}", e))?;

        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        let session = Session::builder()
            .map_err(|e| anyhow!("Session builder: {:?}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| anyhow!("Optimization level: {:?}", e))?
            .with_intra_threads(num_threads)
            .map_err(|e| anyhow!("Intra threads: {:?}", e))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| anyhow!("Failed to load model: {:?}", e))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        tracing::info!(
            model = %model_path.display(),
            inputs = ?input_names,
            "[OnnxEngine] Model loaded"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_names,
        })
    }

    fn find_model(model_dir: &Path) -> Result<PathBuf> {
        let candidates = [
            model_dir.join("model_O4.onnx"),
            model_dir.join("model.onnx"),
        ];
        for path in &candidates {
            if path.exists() {
                return Ok(path.clone());
            }
        }
        Err(anyhow!("No ONNX model found in: {}", model_dir.display()))
    }

    fn to_value(name: &str, shape: Vec<usize>, data: TensorData) -> Result<DynValue> {
        let value = match data {
            TensorData::Float32(v) => Value::from_array((shape, v)).map(|t| t.into_dyn()),
            TensorData::Float64(v) => Value::from_array((shape, v)).map(|t| t.into_dyn()),
            TensorData::Int32(v) => Value::from_array((shape, v)).map(|t| t.into_dyn()),
            TensorData::Int64(v) => Value::from_array((shape, v)).map(|t| t.into_dyn()),
            TensorData::Int8(v) => Value::from_array((shape, v)).map(|t| t.into_dyn()),
            TensorData::UInt8(v) => Value::from_array((shape, v)).map(|t| t.into_dyn()),
            TensorData::Boolean(v) => Value::from_array((shape, v)).map(|t| t.into_dyn()),
        };
        value.map_err(|e| anyhow!("{}: {:?}", name, e))
    }

    fn output_tensor(name: &str, dims: &[i64], data: TensorData) -> Result<NamedTensor> {
        let mut shape: Vec<usize> = dims.iter().map(|&d| d as usize).collect();
        if shape.len() > 1 && shape[0] == 1 {
            shape.remove(0);
        }
        NamedTensor::new(name, shape, data).map_err(Into::into)
    }
}

impl ModelEngine for OnnxEngine {
    fn run(&self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
        let mut feeds: Vec<(String, DynValue)> = Vec::with_capacity(inputs.len());
        for tensor in inputs {
            if !self.input_names.is_empty() && !self.input_names.iter().any(|n| n == tensor.name()) {
                tracing::debug!(input = tensor.name(), "[OnnxEngine] Model does not declare input, skipping");
                continue;
            }
            let (name, shape, data) = tensor.into_parts();
            let data = data.ok_or_else(|| anyhow!("Input '{}' has no numeric data", name))?;
            let mut batched = Vec::with_capacity(shape.len() + 1);
            batched.push(1);
            batched.extend(shape);
            let value = Self::to_value(&name, batched, data)?;
            feeds.push((name, value));
        }

        let mut session = self.session.lock();
        let outputs = session
            .run(feeds)
            .map_err(|e| anyhow!("Inference failed: {:?}", e))?;

        let mut tensors = Vec::new();
        for (name, value) in outputs.iter() {
            let tensor = if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
                Self::output_tensor(name, shape, TensorData::Float32(data.to_vec()))?
            } else if let Ok((shape, data)) = value.try_extract_tensor::<i64>() {
                Self::output_tensor(name, shape, TensorData::Int64(data.to_vec()))?
            } else if let Ok((shape, data)) = value.try_extract_tensor::<i32>() {
                Self::output_tensor(name, shape, TensorData::Int32(data.to_vec()))?
            } else if let Ok((shape, data)) = value.try_extract_tensor::<f64>() {
                Self::output_tensor(name, shape, TensorData::Float64(data.to_vec()))?
            } else if let Ok((shape, data)) = value.try_extract_tensor::<u8>() {
                Self::output_tensor(name, shape, TensorData::UInt8(data.to_vec()))?
            } else if let Ok((shape, data)) = value.try_extract_tensor::<i8>() {
                Self::output_tensor(name, shape, TensorData::Int8(data.to_vec()))?
            } else if let Ok((shape, data)) = value.try_extract_tensor::<bool>() {
                Self::output_tensor(name, shape, TensorData::Boolean(data.to_vec()))?
            } else {
                return Err(anyhow!("Output '{}' has an unsupported element type", name));
            };
            tensors.push(tensor);
        }

        tracing::debug!(outputs = tensors.len(), "[OnnxEngine] Inference complete");
        Ok(tensors)
    }
}
