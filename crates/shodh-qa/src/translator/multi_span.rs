use anyhow::{anyhow, Result};
use std::sync::Arc;

use super::{integer_values, output_at, Translator, TranslatorContext, TranslatorInput};
use super::{ANSWERS, LABELS, NUM_SPANS};
use crate::config::{QaConfig, TaskKind};
use crate::decode::{join_answers, SpanDecoder};
use crate::encoding::TextCodec;
use crate::error::TensorError;
use crate::tensor::{InputBuilder, NamedTensor, TensorData, TensorEnvelope};
use crate::types::{DecodeResult, Span};

/// Extractive QA over a BIO-labelling model.
///
/// The model returns its span count first and the per-token label ids second.
pub struct MultiSpanTranslator {
    codec: Arc<dyn TextCodec>,
    inputs: InputBuilder,
    separator: String,
    answer_separator: String,
}

impl MultiSpanTranslator {
    pub fn new(codec: Arc<dyn TextCodec>, config: &QaConfig) -> Self {
        Self {
            codec,
            inputs: InputBuilder::new(config.model.include_token_type_ids),
            separator: config.special_tokens.separator.clone(),
            answer_separator: config.decoding.answer_separator.clone(),
        }
    }

    /// Model span count, raw labels and the decoded spans.
    fn spans(&self, ctx: &TranslatorContext, outputs: &[NamedTensor]) -> Result<(i64, Vec<i64>, Vec<Span>)> {
        let num_spans = integer_values(output_at(outputs, 0, "span count")?)?
            .first()
            .copied()
            .ok_or_else(|| TensorError::InvalidModelOutput("span count tensor is empty".to_string()))?;
        let labels = integer_values(output_at(outputs, 1, "label ids")?)?;

        let tokens = ctx.encoding.tokens();
        let separator = ctx.encoding.separator_index(&self.separator);
        let spans = SpanDecoder::new(self.codec.as_ref()).decode(tokens, &labels, separator)?;

        if spans.len() as i64 != num_spans {
            tracing::debug!(
                model_count = num_spans,
                decoded = spans.len(),
                "[MultiSpanTranslator] Model span count differs from decoded spans"
            );
        }

        Ok((num_spans, labels, spans))
    }
}

impl Translator for MultiSpanTranslator {
    fn task(&self) -> TaskKind {
        TaskKind::MultiSpanQa
    }

    fn process_input(&self, input: &TranslatorInput) -> Result<(TranslatorContext, Vec<NamedTensor>)> {
        let TranslatorInput::Pair { question, context } = input else {
            return Err(anyhow!("multi-span QA needs a question and a context"));
        };
        let encoding = self.codec.encode_pair(question, context)?;
        let tensors = self.inputs.build(&encoding, None)?;
        Ok((TranslatorContext::new(encoding), tensors))
    }

    fn decode(&self, ctx: &TranslatorContext, outputs: &[NamedTensor]) -> Result<Option<DecodeResult>> {
        let (num_spans, _, spans) = self.spans(ctx, outputs)?;
        Ok(Some(DecodeResult::Spans { spans, num_spans }))
    }

    fn process_output(&self, ctx: &TranslatorContext, outputs: Vec<NamedTensor>) -> Result<TensorEnvelope> {
        let (num_spans, labels, spans) = self.spans(ctx, &outputs)?;
        let answers = join_answers(&spans, &self.answer_separator);
        tracing::debug!(spans = spans.len(), "[MultiSpanTranslator] Decoded answers");

        Ok(TensorEnvelope::new(vec![
            NamedTensor::new(NUM_SPANS, vec![1], TensorData::Int64(vec![num_spans]))?,
            NamedTensor::vector(LABELS, TensorData::Int64(labels)),
            NamedTensor::text(ANSWERS, answers),
        ]))
    }
}
