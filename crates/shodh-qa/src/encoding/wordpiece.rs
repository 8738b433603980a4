use anyhow::Result;

use super::Detokenizer;

/// WordPiece text reconstruction without a loaded tokenizer.
///
/// Continuation pieces (`##` prefix) are glued to the previous piece, other
/// pieces are space separated, and the usual spacing artifacts around
/// punctuation and contractions are cleaned up.
#[derive(Debug, Clone)]
pub struct WordPieceDetokenizer {
    prefix: String,
    cleanup: bool,
}

impl Default for WordPieceDetokenizer {
    fn default() -> Self {
        Self {
            prefix: "##".to_string(),
            cleanup: true,
        }
    }
}

impl WordPieceDetokenizer {
    pub fn new(prefix: impl Into<String>, cleanup: bool) -> Self {
        Self {
            prefix: prefix.into(),
            cleanup,
        }
    }

    fn cleanup(text: String) -> String {
        text.replace(" .", ".")
            .replace(" ?", "?")
            .replace(" !", "!")
            .replace(" ,", ",")
            .replace(" ' ", "'")
            .replace(" n't", "n't")
            .replace(" 'm", "'m")
            .replace(" 's", "'s")
            .replace(" 've", "'ve")
            .replace(" 're", "'re")
    }
}

impl Detokenizer for WordPieceDetokenizer {
    fn detokenize(&self, tokens: &[String]) -> Result<String> {
        let mut text = String::new();
        for (i, token) in tokens.iter().enumerate() {
            match token.strip_prefix(self.prefix.as_str()) {
                Some(rest) if !self.prefix.is_empty() => text.push_str(rest),
                _ => {
                    if i > 0 {
                        text.push(' ');
                    }
                    text.push_str(token);
                }
            }
        }

        if self.cleanup {
            text = Self::cleanup(text);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_glues_continuation_pieces() {
        let d = WordPieceDetokenizer::default();
        let text = d
            .detokenize(&strings(&["mam", "##mal", "##s", "are", "warm", "."]))
            .unwrap();
        assert_eq!(text, "mammals are warm.");
    }

    #[test]
    fn test_contractions_and_commas() {
        let d = WordPieceDetokenizer::default();
        let text = d
            .detokenize(&strings(&["it", "'s", "fine", ",", "isn", "'", "t", "it", "?"]))
            .unwrap();
        assert_eq!(text, "it's fine, isn't it?");
    }

    #[test]
    fn test_without_cleanup() {
        let d = WordPieceDetokenizer::new("##", false);
        assert_eq!(d.detokenize(&strings(&["a", "."])).unwrap(), "a .");
    }

    #[test]
    fn test_empty_run() {
        assert_eq!(WordPieceDetokenizer::default().detokenize(&[]).unwrap(), "");
    }
}
