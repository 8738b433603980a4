//! Tokenizer boundary: the per-call `Encoding` and the encode / detokenize capabilities.

pub mod hf;
pub mod wordpiece;

use anyhow::{anyhow, Result};

pub use hf::HfTokenizer;
pub use wordpiece::WordPieceDetokenizer;

/// Tokenized (question, context) pair or single text. Immutable once built and
/// owned by the call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    ids: Vec<i64>,
    attention_mask: Vec<i64>,
    tokens: Vec<String>,
    type_ids: Vec<i64>,
    offsets: Option<Vec<(usize, usize)>>,
}

impl Encoding {
    /// Parallel per-token sequences must all have the same length.
    pub fn new(ids: Vec<i64>, attention_mask: Vec<i64>, tokens: Vec<String>) -> Result<Self> {
        if ids.len() != attention_mask.len() || ids.len() != tokens.len() {
            return Err(anyhow!(
                "Encoding length mismatch: {} ids, {} mask bits, {} tokens",
                ids.len(),
                attention_mask.len(),
                tokens.len()
            ));
        }
        let type_ids = vec![0; ids.len()];
        Ok(Self {
            ids,
            attention_mask,
            tokens,
            type_ids,
            offsets: None,
        })
    }

    pub fn with_type_ids(mut self, type_ids: Vec<i64>) -> Result<Self> {
        if type_ids.len() != self.ids.len() {
            return Err(anyhow!(
                "Encoding length mismatch: {} ids, {} type ids",
                self.ids.len(),
                type_ids.len()
            ));
        }
        self.type_ids = type_ids;
        Ok(self)
    }

    pub fn with_offsets(mut self, offsets: Vec<(usize, usize)>) -> Result<Self> {
        if offsets.len() != self.ids.len() {
            return Err(anyhow!(
                "Encoding length mismatch: {} ids, {} offsets",
                self.ids.len(),
                offsets.len()
            ));
        }
        self.offsets = Some(offsets);
        Ok(self)
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn attention_mask(&self) -> &[i64] {
        &self.attention_mask
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn type_ids(&self) -> &[i64] {
        &self.type_ids
    }

    pub fn offsets(&self) -> Option<&[(usize, usize)]> {
        self.offsets.as_deref()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Position of the first separator marker, if any.
    pub fn separator_index(&self, separator: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t == separator)
    }
}

/// Turns text into an `Encoding`.
pub trait PairEncoder: Send + Sync {
    /// Joint encoding of a question segment and a context segment.
    fn encode_pair(&self, question: &str, context: &str) -> Result<Encoding>;

    /// Encoding of a single text segment.
    fn encode(&self, text: &str) -> Result<Encoding>;
}

/// Rebuilds readable text from an ordered run of token strings.
pub trait Detokenizer: Send + Sync {
    fn detokenize(&self, tokens: &[String]) -> Result<String>;
}

/// Both halves of the tokenizer boundary, as held by the translators.
pub trait TextCodec: PairEncoder + Detokenizer {}

impl<T: PairEncoder + Detokenizer> TextCodec for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_encoding_rejects_ragged_sequences() {
        assert!(Encoding::new(vec![1, 2], vec![1], strings(&["a", "b"])).is_err());
        let enc = Encoding::new(vec![1, 2], vec![1, 1], strings(&["a", "b"])).unwrap();
        assert!(enc.clone().with_type_ids(vec![0]).is_err());
        assert!(enc.with_offsets(vec![(0, 1)]).is_err());
    }

    #[test]
    fn test_separator_index_finds_first_marker() {
        let enc = Encoding::new(
            vec![101, 7, 102, 8, 102],
            vec![1; 5],
            strings(&["[CLS]", "q", "[SEP]", "c", "[SEP]"]),
        )
        .unwrap();
        assert_eq!(enc.separator_index("[SEP]"), Some(2));
        assert_eq!(enc.separator_index("</s>"), None);
        assert_eq!(enc.type_ids(), &[0, 0, 0, 0, 0]);
        assert!(enc.offsets().is_none());
    }
}
