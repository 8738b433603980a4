use crate::config::SpecialTokens;
use crate::types::SemanticUnitMap;

/// Tokens that close a sentence when they stand alone.
const SENTENCE_TERMINATORS: [&str; 3] = [".", "!", "?"];

/// Assign every token the index of the sentence it belongs to.
///
/// The counter restarts at 0 after each separator, so question and context
/// segments are numbered independently. A standalone terminator token belongs
/// to the sentence it closes.
pub fn map_tokens_to_units(tokens: &[String], markers: &SpecialTokens) -> SemanticUnitMap {
    let mut units = Vec::with_capacity(tokens.len());
    let mut current = 0usize;

    for token in tokens {
        if *token == markers.separator {
            current = 0;
            units.push(None);
            continue;
        }
        if *token == markers.class || *token == markers.padding {
            units.push(None);
            continue;
        }

        units.push(Some(current));
        if SENTENCE_TERMINATORS.contains(&token.as_str()) {
            current += 1;
        }
    }

    SemanticUnitMap::new(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_question_and_context_numbering() {
        let toks = tokens(&[
            "[CLS]", "what", "are", "cats", "?", "[SEP]", "cats", "are", "mammals", ".", "dogs",
            "are", "too", ".", "[SEP]", "[PAD]",
        ]);
        let map = map_tokens_to_units(&toks, &SpecialTokens::default());
        assert_eq!(
            map.to_tensor_values(),
            vec![-1, 0, 0, 0, 0, -1, 0, 0, 0, 0, 1, 1, 1, 1, -1, -1]
        );
        assert_eq!(map.len(), toks.len());
    }

    #[test]
    fn test_subword_punctuation_is_not_a_terminator() {
        let toks = tokens(&["[CLS]", "q", "[SEP]", "v1", "##.", "##2", "ok", "!", "more"]);
        let map = map_tokens_to_units(&toks, &SpecialTokens::default());
        assert_eq!(map.units(), &[None, Some(0), None, Some(0), Some(0), Some(0), Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn test_custom_markers() {
        let markers = SpecialTokens {
            separator: "</s>".to_string(),
            class: "<s>".to_string(),
            padding: "<pad>".to_string(),
        };
        let toks = tokens(&["<s>", "a", ".", "</s>", "b", "<pad>"]);
        let map = map_tokens_to_units(&toks, &markers);
        assert_eq!(map.to_tensor_values(), vec![-1, 0, 0, -1, 0, -1]);
    }

    #[test]
    fn test_empty_tokens() {
        assert!(map_tokens_to_units(&[], &SpecialTokens::default()).is_empty());
    }

    proptest! {
        #[test]
        fn unit_index_resets_after_separator(
            question in proptest::collection::vec(prop_oneof!["[a-z]{1,5}", Just(".".to_string()), Just("?".to_string())], 0..12),
            context in proptest::collection::vec(prop_oneof!["[a-z]{1,5}", Just(".".to_string()), Just("!".to_string())], 1..12),
        ) {
            let mut toks = vec!["[CLS]".to_string()];
            toks.extend(question.iter().cloned());
            let sep = toks.len();
            toks.push("[SEP]".to_string());
            toks.extend(context.iter().cloned());

            let map = map_tokens_to_units(&toks, &SpecialTokens::default());
            prop_assert_eq!(map.len(), toks.len());
            prop_assert_eq!(map.get(sep), None);
            prop_assert_eq!(map.get(sep + 1), Some(0));

            let context_units: Vec<usize> = map.units()[sep + 1..].iter().map(|u| u.unwrap()).collect();
            prop_assert!(context_units.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
