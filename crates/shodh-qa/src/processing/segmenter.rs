use std::ops::Range;
use std::sync::LazyLock;

static SENTENCE_BOUNDARY_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"[.!?]+\s+").expect("sentence boundary regex is valid")
});

/// Split trimmed context text into sentences.
///
/// A boundary is a run of `.`, `!` or `?` followed by whitespace. The
/// whitespace is dropped and the punctuation stays on the sentence it closes.
/// Text without a boundary comes back as a single element; empty input
/// yields `[""]`.
pub fn split_sentences(context: &str) -> Vec<String> {
    sentence_ranges(context)
        .into_iter()
        .map(|range| context[range].to_string())
        .collect()
}

/// Byte ranges into `context` of the sentences `split_sentences` returns.
pub fn sentence_ranges(context: &str) -> Vec<Range<usize>> {
    let lead = context.len() - context.trim_start().len();
    let text = context.trim();
    let mut ranges = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY_RE.find_iter(text) {
        let punctuation_len = boundary.as_str().trim_end().len();
        ranges.push(lead + start..lead + boundary.start() + punctuation_len);
        start = boundary.end();
    }

    if start < text.len() || ranges.is_empty() {
        ranges.push(lead + start..lead + text.len());
    }

    ranges
}
