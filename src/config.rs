//! Configuration for span evaluation.
//!
//! Supports both environment variables and a YAML config file.
//! Environment variables take precedence over config file values; the CLI
//! applies its own flags on top of the loaded configuration.

use crate::error::{Result, SpanEvalError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which embedding provider to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Deterministic token hashing (no model download).
    #[default]
    Hashing,
    /// Sentence-transformers model through candle (feature `model`).
    Model,
}

impl FromStr for Backend {
    type Err = SpanEvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashing" | "hash" => Ok(Backend::Hashing),
            "model" | "bert" => Ok(Backend::Model),
            other => Err(SpanEvalError::InvalidConfig(format!(
                "unknown embedding backend '{}' (expected 'hashing' or 'model')",
                other
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Hashing => write!(f, "hashing"),
            Backend::Model => write!(f, "model"),
        }
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider backend.
    #[serde(default)]
    pub backend: Backend,

    /// Hugging Face model id (model backend).
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Vector dimension (hashing backend; the model backend reads its own).
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Texts per forward pass (model backend).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Tokens kept per text before truncation (model backend).
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Memoize vectors per distinct input string.
    #[serde(default)]
    pub cache: bool,
}

fn default_model_id() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_batch_size() -> usize {
    32
}

fn default_max_length() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model_id: default_model_id(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            max_length: default_max_length(),
            cache: false,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding settings
    pub embedding: EmbeddingConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    embedding: Option<EmbeddingFileSection>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingFileSection {
    backend: Option<Backend>,
    model_id: Option<String>,
    dimension: Option<usize>,
    batch_size: Option<usize>,
    max_length: Option<usize>,
    cache: Option<bool>,
}

impl Config {
    /// Load configuration from environment variables and the default config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (SPAN_EVAL_BACKEND, SPAN_EVAL_MODEL, ...)
    /// 2. Config file (~/.config/span-eval/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Like [`Config::load`], reading `path` instead of the default config file.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        Self::load_with_vars(path, |key| env::var(key).ok())
    }

    /// Layer `SPAN_EVAL_*` values from `var` over the file (or default) config.
    fn load_with_vars<F>(path: Option<&Path>, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::config_file_path() {
                Some(default_path) if default_path.exists() => {
                    Self::load_from_file(&default_path)?
                }
                _ => Config::default(),
            },
        };

        config.apply_env(var)?;
        Ok(config)
    }

    /// Override fields from `SPAN_EVAL_*` variables.
    fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = var("SPAN_EVAL_BACKEND") {
            self.embedding.backend = backend.parse()?;
        }

        if let Some(model) = var("SPAN_EVAL_MODEL") {
            self.embedding.model_id = model;
        }

        if let Some(dimension) = parse_var(&var, "SPAN_EVAL_DIMENSION") {
            self.embedding.dimension = dimension;
        }

        if let Some(batch_size) = parse_var(&var, "SPAN_EVAL_BATCH_SIZE") {
            self.embedding.batch_size = batch_size;
        }

        if let Some(max_length) = parse_var(&var, "SPAN_EVAL_MAX_LENGTH") {
            self.embedding.max_length = max_length;
        }

        if let Some(cache) = parse_var(&var, "SPAN_EVAL_CACHE") {
            self.embedding.cache = cache;
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SpanEvalError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text; missing keys keep their defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| SpanEvalError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(embedding) = file_config.embedding {
            if let Some(backend) = embedding.backend {
                config.embedding.backend = backend;
            }
            if let Some(model_id) = embedding.model_id {
                config.embedding.model_id = model_id;
            }
            if let Some(dimension) = embedding.dimension {
                config.embedding.dimension = dimension;
            }
            if let Some(batch_size) = embedding.batch_size {
                config.embedding.batch_size = batch_size;
            }
            if let Some(max_length) = embedding.max_length {
                config.embedding.max_length = max_length;
            }
            if let Some(cache) = embedding.cache {
                config.embedding.cache = cache;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "span-eval")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate the configuration before building a provider.
    pub fn validate(&self) -> Result<()> {
        let embedding = &self.embedding;

        if embedding.dimension == 0 {
            return Err(SpanEvalError::InvalidConfig(
                "Embedding dimension must be positive.".to_string(),
            ));
        }

        if embedding.batch_size == 0 {
            return Err(SpanEvalError::InvalidConfig(
                "Batch size must be positive.".to_string(),
            ));
        }

        if embedding.max_length == 0 {
            return Err(SpanEvalError::InvalidConfig(
                "Max length must be positive.".to_string(),
            ));
        }

        if embedding.backend == Backend::Model {
            if embedding.model_id.trim().is_empty() {
                return Err(SpanEvalError::InvalidConfig(
                    "Model id is required for the model backend. Set SPAN_EVAL_MODEL or add to config file."
                        .to_string(),
                ));
            }
            if !cfg!(feature = "model") {
                return Err(SpanEvalError::InvalidConfig(
                    "The model backend requires building with the `model` feature.".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Create a config for the given backend (useful for testing).
    pub fn with_backend(backend: Backend) -> Self {
        Self {
            embedding: EmbeddingConfig {
                backend,
                ..Default::default()
            },
        }
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(key).and_then(|value| value.trim().parse().ok())
}
