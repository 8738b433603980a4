use anyhow::Result;
use std::sync::Arc;

use super::{Translator, TranslatorContext, TranslatorInput};
use crate::config::{QaConfig, TaskKind};
use crate::encoding::TextCodec;
use crate::tensor::{InputBuilder, NamedTensor, TensorEnvelope, TensorSerializer};

/// Sentence-embedding models: every engine output is handed back unchanged.
pub struct TextEmbeddingTranslator {
    codec: Arc<dyn TextCodec>,
    inputs: InputBuilder,
    serializer: TensorSerializer,
}

impl TextEmbeddingTranslator {
    pub fn new(codec: Arc<dyn TextCodec>, config: &QaConfig) -> Self {
        Self {
            codec,
            inputs: InputBuilder::new(config.model.include_token_type_ids),
            serializer: TensorSerializer::new(config.decoding.attach_byte_buffers),
        }
    }
}

impl Translator for TextEmbeddingTranslator {
    fn task(&self) -> TaskKind {
        TaskKind::TextEmbedding
    }

    fn process_input(&self, input: &TranslatorInput) -> Result<(TranslatorContext, Vec<NamedTensor>)> {
        let encoding = match input {
            TranslatorInput::Text(text) => self.codec.encode(text)?,
            TranslatorInput::Pair { question, context } => self.codec.encode_pair(question, context)?,
        };
        let tensors = self.inputs.build(&encoding, None)?;
        Ok((TranslatorContext::new(encoding), tensors))
    }

    fn process_output(&self, _ctx: &TranslatorContext, outputs: Vec<NamedTensor>) -> Result<TensorEnvelope> {
        Ok(self.serializer.serialize(outputs))
    }
}
