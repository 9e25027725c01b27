pub mod config;
pub mod dataset;
pub mod error;
pub mod qa_engine;
pub mod query;
pub mod types;

// Re-export primary types for convenience
pub use config::{EngineConfig, QueryConfig};
pub use dataset::{DatasetHandle, DatasetSource, DatasetStore, KnownValueSets};
pub use error::LoadError;
pub use qa_engine::QaEngine;
pub use types::{
    AnswerResult, ClimateRecord, CropRecord, Intent, MissingField, Outcome, ParsedQuery, Ranking,
    Row,
};

// Re-export common types
pub use anyhow::{Error, Result};
