//! Configuration loading, validation, and management for recollect.
//!
//! Loads configuration from `~/.recollect/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.recollect/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecollectConfig {
    /// Extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Consolidation (merge / link) thresholds
    #[serde(default)]
    pub consolidation: ConsolidationConfig,

    /// Ranking weights and budget defaults
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Working set assembly
    #[serde(default)]
    pub working_set: WorkingSetConfig,

    /// Persistence backend
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Lines shorter than this are never classified as semantic items.
    #[serde(default = "default_semantic_min_line")]
    pub semantic_min_line: usize,

    /// Lines shorter than this are never classified as episodic items.
    #[serde(default = "default_episodic_min_line")]
    pub episodic_min_line: usize,

    /// Scrub secrets, emails and addresses before classification.
    #[serde(default = "default_true")]
    pub redact: bool,
}

fn default_semantic_min_line() -> usize {
    10
}
fn default_episodic_min_line() -> usize {
    15
}
fn default_true() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            semantic_min_line: default_semantic_min_line(),
            episodic_min_line: default_episodic_min_line(),
            redact: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationConfig {
    /// At or above this similarity a candidate is merged into the match.
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: f64,

    /// At or above this similarity (below merge) the candidate is linked.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_merge_threshold() -> f64 {
    0.9
}
fn default_similarity_threshold() -> f64 {
    0.8
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            merge_threshold: default_merge_threshold(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Weights of the seven ranking components.
///
/// `redundancy_penalty` is stored as a magnitude and subtracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_w_task_relevance")]
    pub task_relevance: f64,
    #[serde(default = "default_w_decision_impact")]
    pub decision_impact: f64,
    #[serde(default = "default_w_recency")]
    pub recency: f64,
    #[serde(default = "default_w_graph_degree")]
    pub graph_degree: f64,
    #[serde(default = "default_w_failure_impact")]
    pub failure_impact: f64,
    #[serde(default = "default_w_usage_frequency")]
    pub usage_frequency: f64,
    #[serde(default = "default_w_redundancy_penalty")]
    pub redundancy_penalty: f64,
}

fn default_w_task_relevance() -> f64 {
    0.28
}
fn default_w_decision_impact() -> f64 {
    0.22
}
fn default_w_recency() -> f64 {
    0.16
}
fn default_w_graph_degree() -> f64 {
    0.12
}
fn default_w_failure_impact() -> f64 {
    0.12
}
fn default_w_usage_frequency() -> f64 {
    0.08
}
fn default_w_redundancy_penalty() -> f64 {
    0.06
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            task_relevance: default_w_task_relevance(),
            decision_impact: default_w_decision_impact(),
            recency: default_w_recency(),
            graph_degree: default_w_graph_degree(),
            failure_impact: default_w_failure_impact(),
            usage_frequency: default_w_usage_frequency(),
            redundancy_penalty: default_w_redundancy_penalty(),
        }
    }
}

impl ScoringWeights {
    /// Sum of the six positive weights.
    pub fn positive_sum(&self) -> f64 {
        self.task_relevance
            + self.decision_impact
            + self.recency
            + self.graph_degree
            + self.failure_impact
            + self.usage_frequency
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub weights: ScoringWeights,

    /// Recency half-life in hours (7 days by default).
    #[serde(default = "default_half_life_hours")]
    pub recency_half_life_hours: f64,

    /// Budget used when the caller does not pass one.
    #[serde(default = "default_token_budget")]
    pub default_token_budget: usize,

    /// Items cheaper than this fraction of the budget are accepted even
    /// when they overflow it.
    #[serde(default = "default_small_item_ratio")]
    pub small_item_ratio: f64,
}

fn default_half_life_hours() -> f64 {
    168.0
}
fn default_token_budget() -> usize {
    4000
}
fn default_small_item_ratio() -> f64 {
    0.1
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            recency_half_life_hours: default_half_life_hours(),
            default_token_budget: default_token_budget(),
            small_item_ratio: default_small_item_ratio(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingSetConfig {
    /// Budget used when `build` is called without one.
    #[serde(default = "default_token_budget")]
    pub default_token_budget: usize,
}

impl Default for WorkingSetConfig {
    fn default() -> Self {
        Self {
            default_token_budget: default_token_budget(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "file" (JSONL on disk) or "memory" (ephemeral)
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Directory for the file backend. Defaults to `~/.recollect/memory`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_store_backend() -> String {
    "file".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

impl StoreConfig {
    /// The configured directory, or the default under the config dir.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| RecollectConfig::config_dir().join("memory"))
    }
}

impl RecollectConfig {
    /// Load configuration from the default path (~/.recollect/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `RECOLLECT_STORE_BACKEND`
    /// - `RECOLLECT_STORE_PATH`
    /// - `RECOLLECT_TOKEN_BUDGET`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(backend) = std::env::var("RECOLLECT_STORE_BACKEND") {
            self.store.backend = backend;
        }

        if let Ok(path) = std::env::var("RECOLLECT_STORE_PATH") {
            self.store.path = Some(PathBuf::from(path));
        }

        if let Ok(budget) = std::env::var("RECOLLECT_TOKEN_BUDGET") {
            let budget: usize = budget.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "RECOLLECT_TOKEN_BUDGET must be a positive integer, got '{budget}'"
                ))
            })?;
            self.retrieval.default_token_budget = budget;
            self.working_set.default_token_budget = budget;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".recollect")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.consolidation;
        if !(c.similarity_threshold > 0.0
            && c.similarity_threshold <= c.merge_threshold
            && c.merge_threshold <= 1.0)
        {
            return Err(ConfigError::ValidationError(
                "thresholds must satisfy 0 < similarity_threshold <= merge_threshold <= 1".into(),
            ));
        }

        let w = &self.retrieval.weights;
        if w.positive_sum() <= 0.0 || w.positive_sum() > 1.0 + 1e-9 {
            return Err(ConfigError::ValidationError(format!(
                "positive retrieval weights must sum to a value in (0, 1.0], got {:.3}",
                w.positive_sum()
            )));
        }

        if w.redundancy_penalty < 0.0 {
            return Err(ConfigError::ValidationError(
                "redundancy_penalty is a magnitude and must be >= 0".into(),
            ));
        }

        if self.retrieval.recency_half_life_hours <= 0.0 {
            return Err(ConfigError::ValidationError(
                "recency_half_life_hours must be > 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.retrieval.small_item_ratio) {
            return Err(ConfigError::ValidationError(
                "small_item_ratio must be between 0.0 and 1.0".into(),
            ));
        }

        if !matches!(self.store.backend.as_str(), "file" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown store backend '{}', expected 'file' or 'memory'",
                self.store.backend
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = RecollectConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.consolidation.merge_threshold, 0.9);
        assert_eq!(config.consolidation.similarity_threshold, 0.8);
        assert_eq!(config.retrieval.default_token_budget, 4000);
        assert_eq!(config.store.backend, "file");
    }

    #[test]
    fn default_weights_stay_within_unit_sum() {
        let weights = ScoringWeights::default();
        assert!((weights.positive_sum() - 0.98).abs() < 1e-9);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = RecollectConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: RecollectConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.retrieval.weights.recency, config.retrieval.weights.recency);
        assert_eq!(parsed.extraction.episodic_min_line, 15);
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let config = RecollectConfig {
            consolidation: ConsolidationConfig {
                merge_threshold: 0.7,
                similarity_threshold: 0.8,
            },
            ..RecollectConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unbalanced_weights_rejected() {
        let mut config = RecollectConfig::default();
        config.retrieval.weights.task_relevance = 0.9;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("(0, 1.0]"));
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = RecollectConfig::default();
        config.store.backend = "redis".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = RecollectConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().retrieval.recency_half_life_hours, 168.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[consolidation]\nmerge_threshold = 0.95\n\n[store]\nbackend = \"memory\""
        )
        .unwrap();

        let config = RecollectConfig::load_from(file.path()).unwrap();
        assert_eq!(config.consolidation.merge_threshold, 0.95);
        assert_eq!(config.consolidation.similarity_threshold, 0.8);
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.working_set.default_token_budget, 4000);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[consolidation\nmerge_threshold = ").unwrap();
        let err = RecollectConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = RecollectConfig::default_toml();
        assert!(toml_str.contains("merge_threshold"));
        assert!(toml_str.contains("recency_half_life_hours"));
    }
}
