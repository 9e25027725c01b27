use anyhow::{Context, Result};

use crate::config::EngineConfig;
use crate::dataset::{DatasetHandle, DatasetSource, DatasetStore};
use crate::error::LoadError;
use crate::query::{format, IntentClassifier, ParameterExtractor, QueryExecutor};
use crate::types::{AnswerResult, ParsedQuery};

/// Answers free-text questions against the current dataset snapshot.
///
/// Cheap to clone; clones share the same dataset handle, so a `reload` on one
/// is seen by all of them on their next request.
#[derive(Debug, Clone)]
pub struct QaEngine {
    dataset: DatasetHandle,
    config: EngineConfig,
}

impl QaEngine {
    pub fn new(store: DatasetStore, config: EngineConfig) -> Self {
        Self {
            dataset: DatasetHandle::new(store),
            config,
        }
    }

    /// Validate `config` and load the dataset it names (or the built-in one).
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;

        let source = match &config.dataset_path {
            Some(path) => DatasetSource::File(path.clone()),
            None => DatasetSource::Reference,
        };
        let description = source.describe();
        let store = DatasetStore::load(source)
            .with_context(|| format!("Failed to load dataset from {}", description))?;

        Ok(Self::new(store, config))
    }

    /// Engine over the bundled reference statistics with default settings.
    pub fn with_reference_data() -> Result<Self> {
        let store = DatasetStore::reference().context("Failed to load built-in reference dataset")?;
        Ok(Self::new(store, EngineConfig::default()))
    }

    /// Classify and extract without executing.
    pub fn parse(&self, question: &str) -> ParsedQuery {
        let store = self.dataset.snapshot();
        let intent = IntentClassifier::new(store.known()).classify(question);
        ParameterExtractor::new(store.known(), &self.config.query).extract(question, intent)
    }

    pub fn answer(&self, question: &str) -> AnswerResult {
        let start = std::time::Instant::now();
        let store = self.dataset.snapshot();

        let intent = IntentClassifier::new(store.known()).classify(question);
        let parsed =
            ParameterExtractor::new(store.known(), &self.config.query).extract(question, intent);
        let result = QueryExecutor::new(&store).execute(&parsed);

        tracing::info!(
            question = %question,
            intent = ?result.intent,
            outcome = ?result.outcome,
            rows = result.table_rows.len(),
            duration_us = start.elapsed().as_micros() as u64,
            "Question answered"
        );
        result
    }

    /// Answer and render as text.
    pub fn ask(&self, question: &str) -> String {
        format(&self.answer(question))
    }

    /// Load a new dataset and publish it. On failure the current one stays in place.
    pub fn reload(&self, source: DatasetSource) -> Result<(), LoadError> {
        let store = DatasetStore::load(source)?;
        self.dataset.replace(store);
        Ok(())
    }

    pub fn dataset(&self) -> &DatasetHandle {
        &self.dataset
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
