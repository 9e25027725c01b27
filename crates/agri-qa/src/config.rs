use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a dataset file to load instead of the bundled one.
pub const DATASET_ENV: &str = "AGRI_QA_DATASET";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// JSON dataset to load; `None` uses the built-in reference statistics.
    pub dataset_path: Option<PathBuf>,
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Crops listed when the question gives no count.
    pub default_top_n: usize,
    /// Upper bound on any requested count.
    pub max_top_n: usize,
    /// Shortest token that may resolve by partial name match.
    pub min_fuzzy_len: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_top_n: 3,
            max_top_n: 10,
            min_fuzzy_len: 3,
        }
    }
}

impl EngineConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.query.max_top_n == 0 {
            return Err("query.max_top_n must be > 0".into());
        }
        if self.query.default_top_n == 0 {
            return Err("query.default_top_n must be > 0".into());
        }
        if self.query.default_top_n > self.query.max_top_n {
            return Err("query.default_top_n must be <= query.max_top_n".into());
        }
        if self.query.min_fuzzy_len == 0 {
            return Err("query.min_fuzzy_len must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Per-user config location, e.g. `~/.config/agri-qa/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("agri-qa").join("config.json"))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let dataset_path = std::env::var(DATASET_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            dataset_path,
            query: QueryConfig::default(),
        }
    }
}
