//! Pipeline configuration.
//!
//! Covers execution limits, synthesis retry budgets, LLM sampling options and
//! storage/corpus locations. Values come from defaults, an optional YAML
//! file, and environment overrides, in that order.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable or file field has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file: {0}")]
    ParseFailed(#[from] serde_yaml::Error),

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the exploration and synthesis pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // Execution settings
    /// Chunk size, which is also the exploration concurrency limit.
    pub chunk_size: usize,
    /// Concurrency limit for report synthesis. Independent of `chunk_size`.
    pub synthesis_concurrency: usize,

    // Synthesis settings
    /// Result items fed into the whole-batch overview report.
    pub overview_top_n: i64,
    /// Result items fed into a single-segment report.
    pub scope_top_n: i64,
    /// Escalating max-output-token budgets tried per scope, in order.
    pub budget_tiers: Vec<u32>,

    // LLM settings
    /// Model used for all generation calls. Empty means the client default.
    pub model: String,
    /// Sampling temperature for exploration calls.
    pub exploration_temperature: f64,
    /// Sampling temperature for synthesis calls.
    pub synthesis_temperature: f64,

    // Storage and input settings
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Directory the document corpus is read from.
    pub corpus_dir: PathBuf,
    /// Optional JSON file overriding the built-in catalogs.
    pub catalog_file: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            synthesis_concurrency: 3,
            overview_top_n: 25,
            scope_top_n: 10,
            budget_tiers: vec![4096, 8192],
            model: String::new(),
            exploration_temperature: 0.9,
            synthesis_temperature: 0.3,
            database_url: "postgres://localhost/ideaforge".to_string(),
            corpus_dir: PathBuf::from("./corpus"),
            catalog_file: None,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    /// Applies environment variable overrides.
    ///
    /// # Environment Variables
    ///
    /// - `IDEAFORGE_CHUNK_SIZE`: chunk size / exploration concurrency
    /// - `IDEAFORGE_SYNTHESIS_CONCURRENCY`: synthesis concurrency
    /// - `IDEAFORGE_MODEL`: model for all generation calls
    /// - `DATABASE_URL`: PostgreSQL connection URL
    /// - `IDEAFORGE_CORPUS_DIR`: corpus directory
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var("IDEAFORGE_CHUNK_SIZE") {
            self.chunk_size = parse_env_value(&val, "IDEAFORGE_CHUNK_SIZE")?;
        }
        if let Ok(val) = std::env::var("IDEAFORGE_SYNTHESIS_CONCURRENCY") {
            self.synthesis_concurrency = parse_env_value(&val, "IDEAFORGE_SYNTHESIS_CONCURRENCY")?;
        }
        if let Ok(val) = std::env::var("IDEAFORGE_MODEL") {
            self.model = val;
        }
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.database_url = val;
        }
        if let Ok(val) = std::env::var("IDEAFORGE_CORPUS_DIR") {
            self.corpus_dir = PathBuf::from(val);
        }
        Ok(self)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.synthesis_concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "synthesis_concurrency must be at least 1".to_string(),
            ));
        }
        if self.budget_tiers.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "budget_tiers must not be empty".to_string(),
            ));
        }
        if self.overview_top_n <= 0 || self.scope_top_n <= 0 {
            return Err(ConfigError::ValidationFailed(
                "top-N limits must be positive".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.exploration_temperature)
            || !(0.0..=2.0).contains(&self.synthesis_temperature)
        {
            return Err(ConfigError::ValidationFailed(
                "temperatures must be within [0.0, 2.0]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses an environment variable value into the target type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 5);
        assert_eq!(config.synthesis_concurrency, 3);
        assert_eq!(config.budget_tiers, vec![4096, 8192]);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = PipelineConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_empty_budget_tiers_rejected() {
        let config = PipelineConfig {
            budget_tiers: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_temperature_rejected() {
        let config = PipelineConfig {
            exploration_temperature: 3.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_file_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "chunk_size: 8\nbudget_tiers: [2048]\ncorpus_dir: /data/corpus\n",
        )
        .unwrap();

        let config = PipelineConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.chunk_size, 8);
        assert_eq!(config.budget_tiers, vec![2048]);
        assert_eq!(config.corpus_dir, PathBuf::from("/data/corpus"));
        // Unspecified fields keep defaults.
        assert_eq!(config.synthesis_concurrency, 3);
    }

    #[test]
    fn test_parse_env_value_invalid() {
        let result: Result<usize, _> = parse_env_value("not-a-number", "KEY");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
