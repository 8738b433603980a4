use anyhow::Result;

use super::labels::SpanLabel;
use crate::encoding::Detokenizer;
use crate::types::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Idle,
    /// Span accumulating tokens; `last` is the most recent appended index.
    Open { start: usize, last: usize },
}

/// BIO state machine turning per-token labels into text spans.
///
/// Only tokens strictly after the separator are decoded. Malformed label
/// runs degrade to partial results instead of failing: an orphan Continue is
/// dropped and unknown label ids are ignored.
pub struct SpanDecoder<'a, D: Detokenizer + ?Sized> {
    detokenizer: &'a D,
}

impl<'a, D: Detokenizer + ?Sized> SpanDecoder<'a, D> {
    pub fn new(detokenizer: &'a D) -> Self {
        Self { detokenizer }
    }

    /// Decode spans from `labels`, aligned index-for-index with `tokens`.
    ///
    /// With no separator the whole sequence is decoded.
    pub fn decode(
        &self,
        tokens: &[String],
        labels: &[i64],
        separator: Option<usize>,
    ) -> Result<Vec<Span>> {
        if labels.len() != tokens.len() {
            tracing::warn!(
                labels = labels.len(),
                tokens = tokens.len(),
                "[SpanDecoder] Label count differs from token count, decoding the overlap"
            );
        }
        let len = labels.len().min(tokens.len());
        let scope_start = match separator {
            Some(sep) => sep.saturating_add(1),
            None => {
                tracing::debug!("[SpanDecoder] No separator token, decoding whole sequence");
                0
            }
        };

        let mut spans = Vec::new();
        let mut state = DecodeState::Idle;

        for (index, &raw) in labels.iter().enumerate().take(len).skip(scope_start) {
            let Some(label) = SpanLabel::from_raw(raw) else {
                tracing::debug!(index, label = raw, "[SpanDecoder] Unknown label id ignored");
                continue;
            };

            state = match (state, label) {
                (DecodeState::Open { start, last }, SpanLabel::Begin) => {
                    spans.push(self.close(tokens, start, last)?);
                    DecodeState::Open { start: index, last: index }
                }
                (DecodeState::Idle, SpanLabel::Begin) => DecodeState::Open { start: index, last: index },
                (DecodeState::Open { start, .. }, SpanLabel::Continue) => {
                    DecodeState::Open { start, last: index }
                }
                (DecodeState::Idle, SpanLabel::Continue) => {
                    tracing::debug!(index, "[SpanDecoder] Continue label without open span dropped");
                    DecodeState::Idle
                }
                (DecodeState::Open { start, last }, SpanLabel::Other) => {
                    spans.push(self.close(tokens, start, last)?);
                    DecodeState::Idle
                }
                (DecodeState::Idle, SpanLabel::Other) => DecodeState::Idle,
            };
        }

        if let DecodeState::Open { start, last } = state {
            spans.push(self.close(tokens, start, last)?);
        }

        Ok(spans)
    }

    fn close(&self, tokens: &[String], start: usize, last: usize) -> Result<Span> {
        let text = self.detokenizer.detokenize(&tokens[start..=last])?;
        Ok(Span {
            start,
            end: last + 1,
            text: text.trim().to_string(),
        })
    }
}

/// Join decoded span texts into the single `answers` string.
pub fn join_answers(spans: &[Span], separator: &str) -> String {
    spans
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}
