//! End-to-end prediction: translator input, model run, translator output.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::{QaConfig, TaskKind};
use crate::encoding::TextCodec;
use crate::engine::ModelEngine;
use crate::tensor::TensorEnvelope;
use crate::translator::{translator_for_task, Translator, TranslatorInput};
use crate::types::DecodeResult;

pub struct QaPipeline {
    translator: Box<dyn Translator>,
    engine: Arc<dyn ModelEngine>,
}

impl QaPipeline {
    pub fn new(translator: Box<dyn Translator>, engine: Arc<dyn ModelEngine>) -> Self {
        Self { translator, engine }
    }

    /// Pipeline for `config.task`.
    pub fn from_config(config: &QaConfig, codec: Arc<dyn TextCodec>, engine: Arc<dyn ModelEngine>) -> Self {
        Self::new(translator_for_task(config.task, codec, config), engine)
    }

    pub fn task(&self) -> TaskKind {
        self.translator.task()
    }

    /// Run one input through the model and return the result envelope.
    pub fn predict(&self, input: &TranslatorInput) -> Result<TensorEnvelope> {
        let (ctx, inputs) = self.translator.process_input(input)?;
        tracing::debug!(task = ?self.task(), tokens = ctx.encoding.len(), "[QaPipeline] Running model");
        let outputs = self.engine.run(inputs).context("Model execution failed")?;
        self.translator.process_output(&ctx, outputs)
    }

    /// Like `predict`, but returns the structured decode instead of the envelope.
    pub fn predict_decoded(&self, input: &TranslatorInput) -> Result<Option<DecodeResult>> {
        let (ctx, inputs) = self.translator.process_input(input)?;
        let outputs = self.engine.run(inputs).context("Model execution failed")?;
        self.translator.decode(&ctx, &outputs)
    }
}
