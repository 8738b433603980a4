use serde::{Deserialize, Serialize};

/// Per-token BIO tag emitted by the multi-span model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpanLabel {
    /// Outside any span; closes an open span.
    Other,
    /// First token of a span.
    Begin,
    /// Continuation of the open span.
    Continue,
}

impl SpanLabel {
    /// `None` for ids outside the 0/1/2 vocabulary.
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Self::Other),
            1 => Some(Self::Begin),
            2 => Some(Self::Continue),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> i64 {
        match self {
            Self::Other => 0,
            Self::Begin => 1,
            Self::Continue => 2,
        }
    }
}
