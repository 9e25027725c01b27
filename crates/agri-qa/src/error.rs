use std::path::PathBuf;

/// Reference data could not be turned into a usable dataset.
///
/// Only raised while loading; request handling never produces errors.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read dataset file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{record}: field `{field}` is not a valid number: {value:?}")]
    InvalidNumber {
        record: String,
        field: &'static str,
        value: String,
    },

    #[error("{record}: {reason}")]
    InvalidRecord { record: String, reason: String },

    #[error("duplicate {kind} record for {key}")]
    DuplicateKey { kind: &'static str, key: String },

    #[error("dataset contains no records")]
    Empty,
}
