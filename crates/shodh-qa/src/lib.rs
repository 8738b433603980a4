pub mod config;
pub mod decode;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod processing;
pub mod tensor;
pub mod translator;
pub mod types;

// Re-export primary types for convenience
pub use config::{QaConfig, TaskKind};
pub use engine::{ModelEngine, OnnxEngine};
pub use error::TensorError;
pub use pipeline::QaPipeline;
pub use tensor::{DataType, NamedTensor, TensorData, TensorEnvelope};
pub use translator::{Translator, TranslatorInput};
pub use types::{DecodeResult, HighlightedSentence, SemanticUnitMap, Span};

// Re-export common types
pub use anyhow::{Error, Result};
