use anyhow::{anyhow, Result};
use std::path::Path;
use std::str::FromStr;
use tokenizers::{Decoder, Tokenizer, TruncationParams};

use super::{Detokenizer, Encoding, PairEncoder, WordPieceDetokenizer};

/// Hugging Face `tokenizer.json` tokenizer behind the pair-encoding boundary.
pub struct HfTokenizer {
    tokenizer: Tokenizer,
    fallback: WordPieceDetokenizer,
}

impl HfTokenizer {
    pub fn from_file(path: &Path, max_length: usize) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Tokenizer not found at: {}", path.display()));
        }
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {:?}", e))?;
        Self::with_truncation(tokenizer, max_length)
    }

    /// Build from the contents of a `tokenizer.json`.
    pub fn from_json(json: &str, max_length: usize) -> Result<Self> {
        let tokenizer = Tokenizer::from_str(json)
            .map_err(|e| anyhow!("Failed to parse tokenizer: {:?}", e))?;
        Self::with_truncation(tokenizer, max_length)
    }

    fn with_truncation(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {:?}", e))?;

        Ok(Self {
            tokenizer,
            fallback: WordPieceDetokenizer::default(),
        })
    }

    fn convert(encoding: tokenizers::Encoding) -> Result<Encoding> {
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        Encoding::new(ids, mask, encoding.get_tokens().to_vec())?
            .with_type_ids(type_ids)?
            .with_offsets(encoding.get_offsets().to_vec())
    }
}

impl PairEncoder for HfTokenizer {
    fn encode_pair(&self, question: &str, context: &str) -> Result<Encoding> {
        let encoding = self
            .tokenizer
            .encode((question, context), true)
            .map_err(|e| anyhow!("Tokenization failed: {:?}", e))?;
        Self::convert(encoding)
    }

    fn encode(&self, text: &str) -> Result<Encoding> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {:?}", e))?;
        Self::convert(encoding)
    }
}

impl Detokenizer for HfTokenizer {
    fn detokenize(&self, tokens: &[String]) -> Result<String> {
        match self.tokenizer.get_decoder() {
            Some(decoder) => decoder
                .decode(tokens.to_vec())
                .map_err(|e| anyhow!("Detokenization failed: {:?}", e)),
            None => self.fallback.detokenize(tokens),
        }
    }
}
