pub mod segmenter;
pub mod unit_map;

pub use segmenter::{sentence_ranges, split_sentences};
pub use unit_map::map_tokens_to_units;
