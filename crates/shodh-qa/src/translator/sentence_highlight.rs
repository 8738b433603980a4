use anyhow::{anyhow, Result};
use std::sync::Arc;

use super::{output_at, Translator, TranslatorContext, TranslatorInput};
use super::{LABELS, NUM_SPANS};
use crate::config::{QaConfig, SpecialTokens, TaskKind};
use crate::decode::{highlighted_sentences, positive_class_probabilities, threshold_labels};
use crate::encoding::TextCodec;
use crate::error::TensorError;
use crate::processing::{map_tokens_to_units, sentence_ranges};
use crate::tensor::{InputBuilder, NamedTensor, TensorData, TensorEnvelope};
use crate::types::DecodeResult;

/// Sentence highlighting: the model scores every token, tokens above the
/// threshold are marked and mapped back to the context sentences they sit in.
pub struct SentenceHighlightTranslator {
    codec: Arc<dyn TextCodec>,
    inputs: InputBuilder,
    markers: SpecialTokens,
    threshold: f32,
}

impl SentenceHighlightTranslator {
    pub fn new(codec: Arc<dyn TextCodec>, config: &QaConfig) -> Self {
        Self {
            codec,
            inputs: InputBuilder::new(config.model.include_token_type_ids),
            markers: config.special_tokens.clone(),
            threshold: config.decoding.highlight_threshold,
        }
    }

    /// One label per encoded token; a logits row count that differs from the
    /// token count is an error.
    fn labels(&self, ctx: &TranslatorContext, outputs: &[NamedTensor]) -> Result<(Vec<i64>, i64)> {
        let logits = output_at(outputs, 0, "highlight logits")?;
        let probabilities = positive_class_probabilities(logits)?;
        if probabilities.len() != ctx.encoding.len() {
            return Err(TensorError::InvalidModelOutput(format!(
                "'{}' has {} rows for {} tokens",
                logits.name(),
                probabilities.len(),
                ctx.encoding.len()
            ))
            .into());
        }
        Ok(threshold_labels(&probabilities, self.threshold))
    }
}

impl Translator for SentenceHighlightTranslator {
    fn task(&self) -> TaskKind {
        TaskKind::SentenceHighlight
    }

    fn process_input(&self, input: &TranslatorInput) -> Result<(TranslatorContext, Vec<NamedTensor>)> {
        let TranslatorInput::Pair { question, context } = input else {
            return Err(anyhow!("sentence highlighting needs a question and a context"));
        };

        let encoding = self.codec.encode_pair(question, context)?;
        let units = map_tokens_to_units(encoding.tokens(), &self.markers);
        let tensors = self.inputs.build(&encoding, Some(&units))?;

        tracing::debug!(
            sentences = sentence_ranges(context).len(),
            tokens = encoding.len(),
            "[SentenceHighlightTranslator] Built inputs"
        );

        let ctx = TranslatorContext {
            encoding,
            context: Some(context.clone()),
            units: Some(units),
        };
        Ok((ctx, tensors))
    }

    fn decode(&self, ctx: &TranslatorContext, outputs: &[NamedTensor]) -> Result<Option<DecodeResult>> {
        let (labels, num_spans) = self.labels(ctx, outputs)?;
        let sentences = match (ctx.encoding.offsets(), &ctx.context) {
            (Some(offsets), Some(context)) => {
                let separator = ctx.encoding.separator_index(&self.markers.separator);
                highlighted_sentences(&labels, offsets, separator, context)
            }
            _ => {
                tracing::debug!("[SentenceHighlightTranslator] No token offsets, skipping sentence selection");
                Vec::new()
            }
        };
        Ok(Some(DecodeResult::Highlights {
            labels,
            num_spans,
            sentences,
        }))
    }

    fn process_output(&self, ctx: &TranslatorContext, outputs: Vec<NamedTensor>) -> Result<TensorEnvelope> {
        let (labels, num_spans) = self.labels(ctx, &outputs)?;
        tracing::debug!(
            highlighted = num_spans,
            tokens = labels.len(),
            "[SentenceHighlightTranslator] Thresholded probabilities"
        );

        Ok(TensorEnvelope::new(vec![
            NamedTensor::new(NUM_SPANS, vec![1], TensorData::Int64(vec![num_spans]))?,
            NamedTensor::vector(LABELS, TensorData::Int64(labels)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::input::SENTENCE_IDS;
    use crate::translator::test_support::WhitespaceCodec;
    use crate::types::HighlightedSentence;

    const QUESTION: &str = "What do cats eat?";
    const CONTEXT: &str = "Cats eat fish. Dogs eat meat.";
    // [CLS] what do cats eat ? [SEP] cats eat fish . dogs eat meat . [SEP]
    const TOKENS: usize = 16;

    fn translator() -> SentenceHighlightTranslator {
        SentenceHighlightTranslator::new(Arc::new(WhitespaceCodec), &QaConfig::default())
    }

    fn logits(positive: &[usize]) -> NamedTensor {
        let mut values = Vec::with_capacity(TOKENS * 2);
        for i in 0..TOKENS {
            if positive.contains(&i) {
                values.extend([-2.0, 2.0]);
            } else {
                values.extend([2.0, -2.0]);
            }
        }
        NamedTensor::new("logits", vec![TOKENS, 2], TensorData::Float32(values)).unwrap()
    }

    #[test]
    fn test_input_includes_sentence_ids() {
        let t = translator();
        let (ctx, tensors) = t.process_input(&TranslatorInput::pair(QUESTION, CONTEXT)).unwrap();
        let names: Vec<&str> = tensors.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["input_ids", "attention_mask", SENTENCE_IDS]);
        assert_eq!(
            tensors[2].data(),
            Some(&TensorData::Int32(vec![
                -1, 0, 0, 0, 0, 0, -1, 0, 0, 0, 0, 1, 1, 1, 1, -1
            ]))
        );
        assert_eq!(ctx.context.as_deref(), Some(CONTEXT));
    }

    #[test]
    fn test_envelope_counts_positive_tokens() {
        let t = translator();
        let (ctx, _) = t.process_input(&TranslatorInput::pair(QUESTION, CONTEXT)).unwrap();
        let env = t.process_output(&ctx, vec![logits(&[8, 9])]).unwrap();

        assert_eq!(env.names(), vec![NUM_SPANS, LABELS]);
        assert_eq!(env.get(NUM_SPANS).unwrap().data(), Some(&TensorData::Int64(vec![2])));
        let labels = env.get(LABELS).unwrap();
        assert_eq!(labels.shape(), &[TOKENS]);
        let mut expected = vec![0; TOKENS];
        expected[8] = 1;
        expected[9] = 1;
        assert_eq!(labels.data(), Some(&TensorData::Int64(expected)));
    }

    #[test]
    fn test_decode_maps_tokens_to_sentences() {
        let t = translator();
        let (ctx, _) = t.process_input(&TranslatorInput::pair(QUESTION, CONTEXT)).unwrap();
        let result = t.decode(&ctx, &[logits(&[3, 12])]).unwrap().unwrap();
        match result {
            DecodeResult::Highlights { num_spans, sentences, .. } => {
                // token 3 is in the question and counts but selects nothing
                assert_eq!(num_spans, 2);
                assert_eq!(
                    sentences,
                    vec![HighlightedSentence {
                        index: 1,
                        text: "Dogs eat meat.".to_string()
                    }]
                );
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_nothing_above_threshold() {
        let t = translator();
        let (ctx, _) = t.process_input(&TranslatorInput::pair(QUESTION, CONTEXT)).unwrap();
        let env = t.process_output(&ctx, vec![logits(&[])]).unwrap();
        assert_eq!(env.get(NUM_SPANS).unwrap().data(), Some(&TensorData::Int64(vec![0])));
    }

    #[test]
    fn test_single_class_logits_are_rejected() {
        let t = translator();
        let (ctx, _) = t.process_input(&TranslatorInput::pair(QUESTION, CONTEXT)).unwrap();
        let bad = NamedTensor::vector("logits", TensorData::Float32(vec![0.3; TOKENS]));
        let err = t.process_output(&ctx, vec![bad]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TensorError>(),
            Some(TensorError::InvalidModelOutput(_))
        ));
    }

    #[test]
    fn test_row_count_must_match_tokens() {
        let t = translator();
        let (ctx, _) = t.process_input(&TranslatorInput::pair(QUESTION, CONTEXT)).unwrap();
        let short = NamedTensor::new("logits", vec![4, 2], TensorData::Float32(vec![0.0; 8])).unwrap();
        let err = t.process_output(&ctx, vec![short.clone()]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TensorError>(),
            Some(TensorError::InvalidModelOutput(_))
        ));
        assert!(t.decode(&ctx, &[short]).is_err());
    }

    #[test]
    fn test_decimal_in_context_keeps_sentence() {
        let t = translator();
        let (ctx, _) = t
            .process_input(&TranslatorInput::pair("When?", "Version 1.2 shipped. Next one."))
            .unwrap();
        // [CLS] when ? [SEP] version 1.2 shipped . next one . [SEP]
        assert_eq!(ctx.encoding.tokens()[6], "shipped");
        let rows = ctx.encoding.len();
        let mut values = vec![2.0f32, -2.0].repeat(rows);
        values[12] = -2.0;
        values[13] = 2.0;
        let logits = NamedTensor::new("logits", vec![rows, 2], TensorData::Float32(values)).unwrap();

        match t.decode(&ctx, &[logits]).unwrap().unwrap() {
            DecodeResult::Highlights { sentences, .. } => assert_eq!(
                sentences,
                vec![HighlightedSentence {
                    index: 0,
                    text: "Version 1.2 shipped.".to_string()
                }]
            ),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_empty_outputs() {
        let t = translator();
        let (ctx, _) = t.process_input(&TranslatorInput::pair(QUESTION, CONTEXT)).unwrap();
        assert!(t.process_output(&ctx, Vec::new()).is_err());
    }
}
