//! Task translators: text in, model tensors out, and model tensors back to results.
//!
//! Each call builds its own `TranslatorContext`, so a translator holds no
//! per-request state and can be shared across threads.

pub mod embedding;
pub mod multi_span;
pub mod sentence_highlight;

use anyhow::Result;
use std::sync::Arc;

use crate::config::{QaConfig, TaskKind};
use crate::encoding::{Encoding, TextCodec};
use crate::error::TensorError;
use crate::tensor::{NamedTensor, TensorEnvelope};
use crate::types::{DecodeResult, SemanticUnitMap};

pub use embedding::TextEmbeddingTranslator;
pub use multi_span::MultiSpanTranslator;
pub use sentence_highlight::SentenceHighlightTranslator;

pub const NUM_SPANS: &str = "num_spans";
pub const LABELS: &str = "labels";
pub const ANSWERS: &str = "answers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslatorInput {
    Pair { question: String, context: String },
    Text(String),
}

impl TranslatorInput {
    pub fn pair(question: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Pair {
            question: question.into(),
            context: context.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Per-call state carried from input building to output decoding.
#[derive(Debug, Clone)]
pub struct TranslatorContext {
    pub encoding: Encoding,
    /// Context text the encoding's second-segment offsets point into.
    pub context: Option<String>,
    pub units: Option<SemanticUnitMap>,
}

impl TranslatorContext {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            context: None,
            units: None,
        }
    }
}

pub trait Translator: Send + Sync {
    fn task(&self) -> TaskKind;

    /// Encode the input and build the model's input tensors.
    fn process_input(&self, input: &TranslatorInput) -> Result<(TranslatorContext, Vec<NamedTensor>)>;

    /// Structured decode of the model outputs; `None` for pass-through tasks.
    fn decode(&self, _ctx: &TranslatorContext, _outputs: &[NamedTensor]) -> Result<Option<DecodeResult>> {
        Ok(None)
    }

    /// Turn the model outputs into the result envelope.
    fn process_output(&self, ctx: &TranslatorContext, outputs: Vec<NamedTensor>) -> Result<TensorEnvelope>;
}

/// Translator for the configured task.
pub fn translator_for_task(
    task: TaskKind,
    codec: Arc<dyn TextCodec>,
    config: &QaConfig,
) -> Box<dyn Translator> {
    match task {
        TaskKind::MultiSpanQa => Box::new(MultiSpanTranslator::new(codec, config)),
        TaskKind::SentenceHighlight => Box::new(SentenceHighlightTranslator::new(codec, config)),
        TaskKind::TextEmbedding => Box::new(TextEmbeddingTranslator::new(codec, config)),
    }
}

/// Output at `position`, or an error naming what the task expected there.
pub(crate) fn output_at<'a>(
    outputs: &'a [NamedTensor],
    position: usize,
    expected: &str,
) -> Result<&'a NamedTensor, TensorError> {
    outputs.get(position).ok_or_else(|| {
        TensorError::InvalidModelOutput(format!(
            "expected {} at output {}, model returned {} outputs",
            expected,
            position,
            outputs.len()
        ))
    })
}

/// Integer values of an output tensor.
pub(crate) fn integer_values(tensor: &NamedTensor) -> Result<Vec<i64>, TensorError> {
    tensor
        .data()
        .and_then(|d| d.to_i64_vec())
        .ok_or_else(|| {
            TensorError::InvalidModelOutput(format!(
                "'{}' must hold integers, got {}",
                tensor.name(),
                tensor.data_type()
            ))
        })
}
