//! Model output interpretation: BIO span decoding and probability thresholding.

pub mod labels;
pub mod span;
pub mod threshold;

pub use labels::SpanLabel;
pub use span::{join_answers, SpanDecoder};
pub use threshold::{
    highlighted_sentences, positive_class_probabilities, threshold_labels,
    DEFAULT_HIGHLIGHT_THRESHOLD,
};
