use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::decode::DEFAULT_HIGHLIGHT_THRESHOLD;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    pub task: TaskKind,
    pub model: ModelConfig,
    pub special_tokens: SpecialTokens,
    pub decoding: DecodingConfig,
}

/// Which translator runs over the model. CLI and config files share the
/// snake_case names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TaskKind {
    /// BIO-labelled multi-span answer extraction.
    MultiSpanQa,
    /// Per-token highlight probabilities aligned to context sentences.
    SentenceHighlight,
    /// Raw embedding tensors passed through the serializer.
    TextEmbedding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub max_length: usize,
    /// Feed `token_type_ids` alongside `input_ids` / `attention_mask`.
    pub include_token_type_ids: bool,
}

/// Marker strings emitted by the tokenizer for control tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecialTokens {
    pub separator: String,
    pub class: String,
    pub padding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodingConfig {
    pub highlight_threshold: f32,
    /// Joins decoded span texts in the `answers` tensor.
    pub answer_separator: String,
    /// Attach raw byte buffers to embedding outputs.
    pub attach_byte_buffers: bool,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            separator: "[SEP]".to_string(),
            class: "[CLS]".to_string(),
            padding: "[PAD]".to_string(),
        }
    }
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            highlight_threshold: DEFAULT_HIGHLIGHT_THRESHOLD,
            answer_separator: " | ".to_string(),
            attach_byte_buffers: true,
        }
    }
}

impl QaConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.max_length == 0 {
            return Err("model.max_length must be > 0".into());
        }
        if !(0.0..=1.0).contains(&self.decoding.highlight_threshold) {
            return Err("decoding.highlight_threshold must be in [0.0, 1.0]".into());
        }
        let markers = &self.special_tokens;
        if markers.separator.is_empty() || markers.class.is_empty() || markers.padding.is_empty() {
            return Err("special_tokens markers must not be empty".into());
        }
        if markers.separator == markers.class || markers.separator == markers.padding {
            return Err("special_tokens.separator must differ from class and padding".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        let partial: PartialConfig = serde_json::from_str(content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        let config = partial.merge_onto(Self::default());
        config.validate()?;
        Ok(config)
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model.model_dir.join("tokenizer.json")
    }
}

impl Default for QaConfig {
    fn default() -> Self {
        let model_dir = if Path::new("models").exists() {
            PathBuf::from("models")
        } else if let Ok(env_path) = std::env::var("MODEL_PATH") {
            PathBuf::from(env_path)
        } else {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("shodh-qa")
                .join("models")
        };

        Self {
            task: TaskKind::MultiSpanQa,
            model: ModelConfig {
                model_dir,
                max_length: 512,
                include_token_type_ids: false,
            },
            special_tokens: SpecialTokens::default(),
            decoding: DecodingConfig::default(),
        }
    }
}

/// File shape: every section optional so a config can override a single field.
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    task: Option<TaskKind>,
    #[serde(default)]
    model: PartialModel,
    special_tokens: Option<SpecialTokens>,
    #[serde(default)]
    decoding: PartialDecoding,
}

#[derive(Debug, Default, Deserialize)]
struct PartialModel {
    model_dir: Option<PathBuf>,
    max_length: Option<usize>,
    include_token_type_ids: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialDecoding {
    highlight_threshold: Option<f32>,
    answer_separator: Option<String>,
    attach_byte_buffers: Option<bool>,
}

impl PartialConfig {
    fn merge_onto(self, mut base: QaConfig) -> QaConfig {
        if let Some(task) = self.task {
            base.task = task;
        }
        if let Some(dir) = self.model.model_dir {
            base.model.model_dir = dir;
        }
        if let Some(max_length) = self.model.max_length {
            base.model.max_length = max_length;
        }
        if let Some(flag) = self.model.include_token_type_ids {
            base.model.include_token_type_ids = flag;
        }
        if let Some(markers) = self.special_tokens {
            base.special_tokens = markers;
        }
        if let Some(threshold) = self.decoding.highlight_threshold {
            base.decoding.highlight_threshold = threshold;
        }
        if let Some(sep) = self.decoding.answer_separator {
            base.decoding.answer_separator = sep;
        }
        if let Some(flag) = self.decoding.attach_byte_buffers {
            base.decoding.attach_byte_buffers = flag;
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = QaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.task, TaskKind::MultiSpanQa);
        assert_eq!(config.decoding.answer_separator, " | ");
        assert_eq!(config.decoding.highlight_threshold, 0.5);
        assert_eq!(config.special_tokens.separator, "[SEP]");
    }

    #[test]
    fn test_partial_file_overrides_single_fields() {
        let config = QaConfig::from_json(
            r#"{"task": "sentence_highlight", "model": {"max_length": 256}, "decoding": {"highlight_threshold": 0.7}}"#,
        )
        .unwrap();
        assert_eq!(config.task, TaskKind::SentenceHighlight);
        assert_eq!(config.model.max_length, 256);
        assert_eq!(config.decoding.highlight_threshold, 0.7);
        assert_eq!(config.decoding.answer_separator, " | ");
        assert!(!config.model.include_token_type_ids);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(QaConfig::from_json(r#"{"model": {"max_length": 0}}"#).is_err());
        assert!(QaConfig::from_json(r#"{"decoding": {"highlight_threshold": 1.5}}"#).is_err());
        assert!(QaConfig::from_json(
            r#"{"special_tokens": {"separator": "[CLS]", "class": "[CLS]", "padding": "[PAD]"}}"#
        )
        .is_err());
        assert!(QaConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_task_names_match_between_cli_and_file() {
        use clap::ValueEnum;

        for task in TaskKind::value_variants() {
            let cli_name = task.to_possible_value().unwrap().get_name().to_string();
            let from_file: TaskKind = serde_json::from_value(serde_json::json!(cli_name)).unwrap();
            assert_eq!(from_file, *task);
        }
        assert_eq!(
            TaskKind::from_str("sentence_highlight", false).unwrap(),
            TaskKind::SentenceHighlight
        );
        assert!(TaskKind::from_str("sentence-highlight", false).is_err());
    }

    #[test]
    fn test_tokenizer_path_under_model_dir() {
        let mut config = QaConfig::default();
        config.model.model_dir = PathBuf::from("/models/bert-qa");
        assert_eq!(config.tokenizer_path(), PathBuf::from("/models/bert-qa/tokenizer.json"));
    }
}
