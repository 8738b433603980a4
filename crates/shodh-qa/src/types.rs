use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Per-token sentence assignment. `None` marks special tokens (class, separator, padding).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SemanticUnitMap(Vec<Option<usize>>);

/// Tensor value standing in for an unassigned token.
pub const UNASSIGNED_UNIT: i32 = -1;

impl SemanticUnitMap {
    pub fn new(units: Vec<Option<usize>>) -> Self {
        Self(units)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.0.get(index).copied().flatten()
    }

    pub fn units(&self) -> &[Option<usize>] {
        &self.0
    }

    /// INT32 values as fed to the model, unassigned rendered as `-1`.
    /// Indices past `i32::MAX` saturate.
    pub fn to_tensor_values(&self) -> Vec<i32> {
        self.0
            .iter()
            .map(|unit| unit.map_or(UNASSIGNED_UNIT, |u| i32::try_from(u).unwrap_or(i32::MAX)))
            .collect()
    }
}

/// Contiguous token range `[start, end)` decoded as one answer unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A sentence selected by the highlight decoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HighlightedSentence {
    pub index: usize,
    pub text: String,
}

/// Structured result of one decode call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DecodeResult {
    /// Multi-span answer extraction. `num_spans` is the model's own count and
    /// is not derived from `spans`, so the two may disagree.
    Spans { spans: Vec<Span>, num_spans: i64 },
    /// Per-token highlight labels, the number of positive labels and the
    /// context sentences those labels fall in.
    Highlights {
        labels: Vec<i64>,
        num_spans: i64,
        sentences: Vec<HighlightedSentence>,
    },
}

impl DecodeResult {
    pub fn num_spans(&self) -> i64 {
        match self {
            Self::Spans { num_spans, .. } | Self::Highlights { num_spans, .. } => *num_spans,
        }
    }
}
